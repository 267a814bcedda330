#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use crate::allotments::{AllotmentRequest, AllotmentServiceTrait};
    use crate::drawdowns::{DrawdownCalculation, DrawdownRepositoryTrait};
    use crate::errors::Error;
    use crate::events::DomainEvent;
    use crate::funds::PortfolioInvestment;
    use crate::reconciliation::{ManualPayment, ReconciliationServiceTrait};
    use crate::reports::{
        OperatorInputs, ReportError, ReportKind, ReportRequest, ReportServiceTrait, ReportStatus,
    };
    use crate::status::LineItemStatus;
    use crate::test_support::{date, quarter, Harness, FUND_ID};

    fn item_id(calc: &DrawdownCalculation, lp_id: &str) -> String {
        calc.line_items
            .iter()
            .find(|i| i.lp_id == lp_id)
            .map(|i| i.id.clone())
            .unwrap()
    }

    fn request(kind: ReportKind) -> ReportRequest {
        ReportRequest {
            fund_id: FUND_ID.to_string(),
            quarter: quarter(),
            kind,
            inputs: OperatorInputs {
                temporary_investments: dec!(250000),
                cash_in_hand: dec!(12000),
                estimated_expenses: dec!(5000),
            },
        }
    }

    /// lp-a and lp-c pay in full during the quarter and are allotted.
    async fn settled_quarter(h: &Harness) -> DrawdownCalculation {
        let calc = h.issue_ten_percent().await;
        for (lp_id, amount) in [("lp-a", dec!(1000000)), ("lp-c", dec!(200000))] {
            h.reconciliation
                .record_manual_payment(ManualPayment {
                    line_item_id: item_id(&calc, lp_id),
                    amount,
                    paid_on: date(2025, 7, 2),
                    transaction_id: None,
                    note: None,
                })
                .await
                .unwrap();
        }
        h.allotments
            .allot_units(AllotmentRequest {
                fund_id: FUND_ID.to_string(),
                quarter: quarter(),
                allotment_date: date(2025, 7, 15),
                line_item_ids: None,
            })
            .await
            .unwrap();
        calc
    }

    #[tokio::test]
    async fn test_sebi_figures() {
        let h = Harness::new();
        settled_quarter(&h).await;
        h.ledger
            .add_portfolio_investment(PortfolioInvestment {
                id: "inv-1".to_string(),
                fund_id: FUND_ID.to_string(),
                company_name: "Acme Robotics".to_string(),
                amount_invested: dec!(400000),
                funding_date: date(2025, 8, 10),
            })
            .unwrap();

        let snapshot = h.reports.generate_report(request(ReportKind::Sebi)).await.unwrap();
        assert_eq!(snapshot.version, 1);
        assert_eq!(snapshot.status, ReportStatus::Draft);
        assert_eq!(snapshot.checksum.len(), 64);

        let f = &snapshot.figures;
        assert_eq!(f.total_commitment_received_initial_close, dec!(17000000));
        assert_eq!(f.total_commitment_received_quarter_end, dec!(17000000));
        assert_eq!(f.gross_cumulative_funds_raised, dec!(1700000));
        assert_eq!(f.cumulative_portfolio_investment_count, 1);
        assert_eq!(f.cumulative_portfolio_investment_amount, dec!(400000));
        // 1,200,000 received less 200,600 of fees.
        assert_eq!(f.investable_funds, dec!(999400));
        assert!(f.invi.is_none());

        let india = f
            .investor_categories
            .iter()
            .find(|c| c.geography == "India")
            .unwrap();
        assert_eq!(india.investor_count, 2);
        assert_eq!(india.total_commitment, dec!(15000000));

        assert!(matches!(
            h.events.events().last(),
            Some(DomainEvent::ReportGenerated { version: 1, .. })
        ));
    }

    #[tokio::test]
    async fn test_invi_lists_foreign_investors_only() {
        let h = Harness::new();
        settled_quarter(&h).await;

        let snapshot = h.reports.generate_report(request(ReportKind::Invi)).await.unwrap();
        let invi = snapshot.figures.invi.unwrap();
        assert_eq!(invi.investors.len(), 1);

        let c = &invi.investors[0];
        assert_eq!(c.lp_id, "lp-c");
        assert_eq!(c.geography, "Singapore");
        assert_eq!(c.quarter_amount, dec!(200000));
        assert_eq!(c.cumulative_amount, dec!(200000));
        assert_eq!(c.units_allotted, 2000);
        assert_eq!(c.dp_id.as_deref(), Some("IN30lp-c"));

        assert_eq!(invi.countries.len(), 1);
        assert_eq!(invi.countries[0].country, "Singapore");
        assert_eq!(invi.countries[0].investor_count, 1);
    }

    #[tokio::test]
    async fn test_regeneration_adds_a_version() {
        let h = Harness::new();
        let calc = settled_quarter(&h).await;

        let first = h.reports.generate_report(request(ReportKind::Sebi)).await.unwrap();
        h.reconciliation
            .record_manual_payment(ManualPayment {
                line_item_id: item_id(&calc, "lp-b"),
                amount: dec!(500000),
                paid_on: date(2025, 8, 1),
                transaction_id: None,
                note: None,
            })
            .await
            .unwrap();
        let second = h.reports.generate_report(request(ReportKind::Sebi)).await.unwrap();
        let invi = h.reports.generate_report(request(ReportKind::Invi)).await.unwrap();

        assert_eq!(second.version, 2);
        assert_eq!(invi.version, 1);
        assert_ne!(first.checksum, second.checksum);
        assert_eq!(
            second.figures.investable_funds - first.figures.investable_funds,
            dec!(500000)
        );

        let stored_first = h.reports.get_report(&first.id).unwrap();
        assert_eq!(stored_first, first);

        let listed = h.reports.list_reports(FUND_ID, &quarter()).unwrap();
        let order: Vec<(ReportKind, i32)> = listed.iter().map(|s| (s.kind, s.version)).collect();
        assert_eq!(
            order,
            vec![
                (ReportKind::Sebi, 1),
                (ReportKind::Sebi, 2),
                (ReportKind::Invi, 1)
            ]
        );
    }

    #[tokio::test]
    async fn test_status_moves_forward_without_touching_figures() {
        let h = Harness::new();
        settled_quarter(&h).await;
        let snapshot = h.reports.generate_report(request(ReportKind::Sebi)).await.unwrap();

        let reviewed = h
            .reports
            .set_report_status(&snapshot.id, ReportStatus::Reviewed)
            .await
            .unwrap();
        assert_eq!(reviewed.status, ReportStatus::Reviewed);
        assert_eq!(reviewed.figures, snapshot.figures);
        assert_eq!(reviewed.checksum, snapshot.checksum);
        assert_eq!(reviewed.version, snapshot.version);

        let err = h
            .reports
            .set_report_status(&snapshot.id, ReportStatus::Draft)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Report(ReportError::InvalidStatusTransition { .. })
        ));
        assert_eq!(err.kind(), "InvalidTransition");

        let submitted = h
            .reports
            .set_report_status(&snapshot.id, ReportStatus::Submitted)
            .await
            .unwrap();
        assert_eq!(submitted.status, ReportStatus::Submitted);
    }

    #[tokio::test]
    async fn test_filing_invi_marks_foreign_line_items() {
        let h = Harness::new();
        let calc = settled_quarter(&h).await;
        let snapshot = h.reports.generate_report(request(ReportKind::Invi)).await.unwrap();
        h.events.clear();

        h.reports
            .set_report_status(&snapshot.id, ReportStatus::Filed)
            .await
            .unwrap();

        let c = h.ledger.get_line_item(&item_id(&calc, "lp-c")).unwrap();
        assert_eq!(c.status, LineItemStatus::InviFiled);
        let a = h.ledger.get_line_item(&item_id(&calc, "lp-a")).unwrap();
        assert_eq!(a.status, LineItemStatus::AllotmentDone);

        let events = h.events.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], DomainEvent::ReportStatusChanged { to, .. } if to == "FILED"));
        assert!(matches!(
            &events[1],
            DomainEvent::LineItemStatusChanged { to: LineItemStatus::InviFiled, .. }
        ));
    }

    #[tokio::test]
    async fn test_submitting_unfiled_invi_marks_foreign_line_items() {
        let h = Harness::new();
        let calc = settled_quarter(&h).await;
        let snapshot = h.reports.generate_report(request(ReportKind::Invi)).await.unwrap();

        let submitted = h
            .reports
            .set_report_status(&snapshot.id, ReportStatus::Submitted)
            .await
            .unwrap();
        assert_eq!(submitted.status, ReportStatus::Submitted);

        let c = h.ledger.get_line_item(&item_id(&calc, "lp-c")).unwrap();
        assert_eq!(c.status, LineItemStatus::InviFiled);
        let a = h.ledger.get_line_item(&item_id(&calc, "lp-a")).unwrap();
        assert_eq!(a.status, LineItemStatus::AllotmentDone);
    }

    #[tokio::test]
    async fn test_filing_sebi_leaves_line_items_alone() {
        let h = Harness::new();
        let calc = settled_quarter(&h).await;
        let snapshot = h.reports.generate_report(request(ReportKind::Sebi)).await.unwrap();

        h.reports
            .set_report_status(&snapshot.id, ReportStatus::Filed)
            .await
            .unwrap();
        let c = h.ledger.get_line_item(&item_id(&calc, "lp-c")).unwrap();
        assert_eq!(c.status, LineItemStatus::AllotmentDone);
    }

    #[tokio::test]
    async fn test_negative_inputs_rejected() {
        let h = Harness::new();
        h.issue_ten_percent().await;
        let mut bad = request(ReportKind::Sebi);
        bad.inputs.estimated_expenses = dec!(-1);

        let err = h.reports.generate_report(bad).await.unwrap_err();
        assert_eq!(err.kind(), "ValidationError");
        assert!(h.reports.list_reports(FUND_ID, &quarter()).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_report_before_any_drawdown() {
        let h = Harness::new();
        let snapshot = h.reports.generate_report(request(ReportKind::Sebi)).await.unwrap();
        assert_eq!(snapshot.figures.gross_cumulative_funds_raised, Decimal::ZERO);
        assert_eq!(
            snapshot.figures.total_commitment_received_quarter_end,
            Decimal::ZERO
        );
    }
}
