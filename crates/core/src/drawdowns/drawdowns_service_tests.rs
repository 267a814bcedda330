#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use crate::drawdowns::{CallSpec, DrawdownError, DrawdownRepositoryTrait, DrawdownServiceTrait};
    use crate::errors::Error;
    use crate::events::DomainEvent;
    use crate::funds::LpStatus;
    use crate::status::{LineItemStatus, StatusServiceTrait};
    use crate::test_support::{limited_partner, quarter, Harness, FUND_ID};

    #[tokio::test]
    async fn test_percentage_call_is_committed() {
        let h = Harness::new();
        let calc = h.issue_ten_percent().await;

        assert!(!calc.preview);
        assert!(calc.fee_quarter);
        assert_eq!(calc.drawdown.total_called, dec!(1700000));
        assert_eq!(calc.drawdown.forecast_period.label(), "FY26Q3");

        let lp_a = calc.line_items.iter().find(|i| i.lp_id == "lp-a").unwrap();
        assert_eq!(lp_a.amount_due, dec!(1000000));
        assert_eq!(lp_a.amount_called_up, dec!(1000000));
        assert_eq!(lp_a.remaining_commitment, dec!(9000000));
        assert_eq!(lp_a.management_fee, dec!(118000));
        assert_eq!(lp_a.stamp_duty, dec!(50));
        assert_eq!(lp_a.status, LineItemStatus::NoticePending);

        let stored = h.ledger.list_line_items(&calc.drawdown.id).unwrap();
        assert_eq!(stored.len(), 3);
        assert!(matches!(
            &h.events.events()[0],
            DomainEvent::DrawdownIssued { total_called, line_item_ids, .. }
                if *total_called == dec!(1700000) && line_item_ids.len() == 3
        ));
    }

    #[tokio::test]
    async fn test_preview_persists_nothing() {
        let h = Harness::new();
        let mut request = h.request(quarter(), CallSpec::percentage(dec!(10)));
        request.preview = true;

        let preview = h.drawdowns.calculate_drawdown(request.clone()).await.unwrap();
        assert!(preview.preview);
        assert!(h.ledger.list_drawdowns(FUND_ID).unwrap().is_empty());
        assert!(h.events.is_empty());

        request.preview = false;
        let committed = h.drawdowns.calculate_drawdown(request).await.unwrap();
        let preview_amounts: Vec<Decimal> =
            preview.line_items.iter().map(|i| i.amount_due).collect();
        let committed_amounts: Vec<Decimal> =
            committed.line_items.iter().map(|i| i.amount_due).collect();
        assert_eq!(preview_amounts, committed_amounts);
    }

    #[tokio::test]
    async fn test_absolute_total_sums_exactly() {
        let h = Harness::new();
        let calc = h
            .drawdowns
            .calculate_drawdown(h.request(quarter(), CallSpec::absolute_total(dec!(1000.03))))
            .await
            .unwrap();

        let sum: Decimal = calc.line_items.iter().map(|i| i.amount_due).sum();
        assert_eq!(sum, dec!(1000.03));
        assert_eq!(calc.drawdown.total_called, dec!(1000.03));
    }

    #[tokio::test]
    async fn test_second_call_for_same_quarter_rejected() {
        let h = Harness::new();
        let first = h.issue_ten_percent().await;

        let err = h
            .drawdowns
            .calculate_drawdown(h.request(quarter(), CallSpec::percentage(dec!(5))))
            .await
            .unwrap_err();
        match err {
            Error::Drawdown(DrawdownError::AlreadyIssued { drawdown_id, .. }) => {
                assert_eq!(drawdown_id, first.drawdown.id);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_cancelled_call_can_be_reissued() {
        let h = Harness::new();
        let first = h.issue_ten_percent().await;
        h.status.cancel_drawdown(&first.drawdown.id).await.unwrap();

        let second = h
            .drawdowns
            .calculate_drawdown(h.request(quarter(), CallSpec::percentage(dec!(5))))
            .await
            .unwrap();

        // Cancelled calls are not prior calls, and the quarter is still the first.
        let lp_a = second.line_items.iter().find(|i| i.lp_id == "lp-a").unwrap();
        assert_eq!(lp_a.amount_called_up, dec!(500000));
        assert!(second.fee_quarter);
    }

    #[tokio::test]
    async fn test_cumulative_calls_and_fee_alternation() {
        let h = Harness::new();
        h.issue_ten_percent().await;

        let q3 = quarter().next();
        let q3_calc = h
            .drawdowns
            .calculate_drawdown(h.request(q3, CallSpec::percentage(dec!(20))))
            .await
            .unwrap();
        let lp_b = q3_calc.line_items.iter().find(|i| i.lp_id == "lp-b").unwrap();
        assert_eq!(lp_b.amount_due, dec!(1000000));
        assert_eq!(lp_b.amount_called_up, dec!(1500000));
        assert_eq!(lp_b.remaining_commitment, dec!(3500000));
        assert!(!q3_calc.fee_quarter);
        assert_eq!(lp_b.management_fee, Decimal::ZERO);

        let q4_calc = h
            .drawdowns
            .calculate_drawdown(h.request(q3.next(), CallSpec::percentage(dec!(80))))
            .await
            .unwrap();
        assert!(q4_calc.fee_quarter);
        let lp_c = q4_calc.line_items.iter().find(|i| i.lp_id == "lp-c").unwrap();
        assert_eq!(lp_c.amount_called_up, dec!(2200000));
        assert_eq!(lp_c.remaining_commitment, dec!(-200000));
        assert!(lp_c.over_committed);
    }

    #[tokio::test]
    async fn test_later_quarter_does_not_count_toward_earlier_call() {
        let h = Harness::new();
        let q3 = quarter().next();
        h.drawdowns
            .calculate_drawdown(h.request(q3, CallSpec::percentage(dec!(10))))
            .await
            .unwrap();

        let q2_calc = h.issue_ten_percent().await;
        let lp_a = q2_calc.line_items.iter().find(|i| i.lp_id == "lp-a").unwrap();
        assert_eq!(lp_a.amount_called_up, dec!(1000000));
        assert_eq!(lp_a.remaining_commitment, dec!(9000000));
        assert!(q2_calc.fee_quarter);
    }

    #[tokio::test]
    async fn test_inactive_lps_are_not_called() {
        let h = Harness::new();
        let mut exited = limited_partner("lp-b", "Harbor Family Office", dec!(5000000), "India");
        exited.status = LpStatus::Exited;
        h.ledger.upsert_limited_partner(exited).unwrap();

        let calc = h.issue_ten_percent().await;
        assert_eq!(calc.line_items.len(), 2);
        assert!(calc.line_items.iter().all(|i| i.lp_id != "lp-b"));
    }

    #[tokio::test]
    async fn test_no_active_lps() {
        let h = Harness::new();
        for (id, name, commitment) in [
            ("lp-a", "Main Street Capital", dec!(10000000)),
            ("lp-b", "Harbor Family Office", dec!(5000000)),
            ("lp-c", "Lion City Ventures", dec!(2000000)),
        ] {
            let mut lp = limited_partner(id, name, commitment, "India");
            lp.status = LpStatus::Inactive;
            h.ledger.upsert_limited_partner(lp).unwrap();
        }

        let err = h
            .drawdowns
            .calculate_drawdown(h.request(quarter(), CallSpec::percentage(dec!(10))))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "NoActiveLPs");
        assert!(h.ledger.list_drawdowns(FUND_ID).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_zero_commitment_fails_whole_call() {
        let h = Harness::new();
        h.ledger
            .upsert_limited_partner(limited_partner("lp-z", "Zero Holdings", dec!(0), "India"))
            .unwrap();

        let err = h
            .drawdowns
            .calculate_drawdown(h.request(quarter(), CallSpec::percentage(dec!(10))))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "DataIntegrityError");
        assert_eq!(err.entity_ids(), vec!["lp-z".to_string()]);
        assert!(h.ledger.list_drawdowns(FUND_ID).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_call_spec_and_dates() {
        let h = Harness::new();
        let err = h
            .drawdowns
            .calculate_drawdown(h.request(quarter(), CallSpec::default()))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "InvalidCallSpec");

        let mut request = h.request(quarter(), CallSpec::percentage(dec!(10)));
        request.notice_date = request.due_date.succ_opt().unwrap();
        let err = h.drawdowns.calculate_drawdown(request).await.unwrap_err();
        assert_eq!(err.kind(), "ValidationError");
    }

    #[tokio::test]
    async fn test_expected_reference_is_trimmed() {
        let h = Harness::new();
        let calc = h.issue_ten_percent().await;
        let id = &calc.line_items[0].id;

        let item = h
            .drawdowns
            .set_expected_reference(id, Some("  UTR-778  ".to_string()))
            .await
            .unwrap();
        assert_eq!(item.expected_reference.as_deref(), Some("UTR-778"));

        let item = h
            .drawdowns
            .set_expected_reference(id, Some("   ".to_string()))
            .await
            .unwrap();
        assert_eq!(item.expected_reference, None);
    }

    #[tokio::test]
    async fn test_summary_rolls_up_least_advanced_status() {
        let h = Harness::new();
        let calc = h.issue_ten_percent().await;
        for item in &calc.line_items {
            h.status
                .transition_status(&item.id, LineItemStatus::Sent)
                .await
                .unwrap();
        }
        h.status
            .transition_status(&calc.line_items[0].id, LineItemStatus::WirePending)
            .await
            .unwrap();

        let summary = h.drawdowns.get_drawdown_summary(&calc.drawdown.id).unwrap();
        assert_eq!(summary.status, Some(LineItemStatus::Sent));
        assert_eq!(h.drawdowns.list_drawdowns(FUND_ID).unwrap().len(), 1);
    }
}
