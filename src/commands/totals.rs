use crate::api::{self, Mode, Summary};
use crate::args::{SummaryArgs, TotalsArgs};
use crate::commands::{load_ledger, sync, Out};
use crate::error::{ErrorType, IntoResult};
use crate::model::Amount;
use crate::totals::Totals;
use crate::{Config, Result};
use anyhow::ensure;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Aggregates every work log and payment of the account.
///
/// When `args.sync` is set the time report is synced first. A failed sync is logged as a warning
/// and the totals are computed from the work logs that were already stored.
///
/// `args.exchange_rate` is today's rate. It only restates the balance in local currency, the
/// payments are always converted at the rate stored with each one.
///
/// # Errors
///
/// - Returns a validation error if the exchange rate is negative.
/// - Returns a data error if a stored payment has a zero exchange rate or the sums overflow.
pub async fn totals(config: Config, mode: Mode, args: TotalsArgs) -> Result<Out<Totals>> {
    let rate = current_rate(args.exchange_rate)?;
    if args.sync {
        if let Err(e) = sync(config.clone(), mode).await {
            warn!("Using the stored work logs because the sync failed: {e:#}");
        }
    }
    let totals = compute(&config, rate).await?;
    Ok(Out::new(totals_message(&totals), totals))
}

/// The totals together with a narrative summary of them.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SummaryOutput {
    pub totals: Totals,
    pub summary: Summary,
}

/// Aggregates the ledger and asks the language model for a short summary of it.
///
/// If the summary cannot be generated the failure is logged and a fixed apology is returned in its
/// place, so this only fails when the totals themselves cannot be computed.
pub async fn summary(config: Config, mode: Mode, args: SummaryArgs) -> Result<Out<SummaryOutput>> {
    let rate = current_rate(args.exchange_rate)?;
    let totals = compute(&config, rate).await?;
    let summarizer = api::summarizer(&config, mode);
    let summary = api::summarize_or_fallback(summarizer.as_ref(), &totals).await;
    Ok(Out::new(
        summary.summary.clone(),
        SummaryOutput { totals, summary },
    ))
}

fn current_rate(rate: Option<Amount>) -> Result<Amount> {
    let rate = rate.unwrap_or_default();
    ensure_not_negative(rate).pub_result(ErrorType::Validation)?;
    Ok(rate)
}

fn ensure_not_negative(rate: Amount) -> Result<()> {
    ensure!(
        !rate.is_negative(),
        "Invalid entry: exchange_rate: must not be negative"
    );
    Ok(())
}

async fn compute(config: &Config, rate: Amount) -> Result<Totals> {
    let ledger = load_ledger(config).await.pub_result(ErrorType::Database)?;
    Totals::compute(ledger.work_logs(), ledger.payments(), rate).pub_result(ErrorType::Data)
}

fn totals_message(totals: &Totals) -> String {
    format!(
        "Total hours: {}\n\
        Total earnings: {}\n\
        Payments received (local currency): {}\n\
        Payments received (earnings currency): {}\n\
        Balance (earnings currency): {}\n\
        Balance (local currency): {}",
        totals.total_hours,
        totals.total_earnings,
        totals.total_payments_local,
        totals.total_payments_earnings_currency,
        totals.balance_earnings_currency,
        totals.balance_local,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::FALLBACK_SUMMARY;
    use crate::error::error_type;
    use crate::test::TestEnv;
    use std::str::FromStr;

    fn amt(s: &str) -> Amount {
        Amount::from_str(s).unwrap()
    }

    #[tokio::test]
    async fn test_totals_of_empty_ledger() {
        let env = TestEnv::new().await;
        let out = totals(env.config(), Mode::Testing, TotalsArgs::default())
            .await
            .unwrap();
        assert_eq!(out.structure().unwrap(), &Totals::default());
        assert!(out.message().contains("Total hours: 0.00"));
    }

    #[tokio::test]
    async fn test_totals_convert_each_payment_at_its_own_rate() {
        let env = TestEnv::new().await;
        env.insert_work_log("Feature work", "10", "8").await;
        env.insert_payment("400000", "50000").await;
        env.insert_payment("550000", "55000").await;

        let args = TotalsArgs {
            exchange_rate: Some(amt("60000")),
            sync: false,
        };
        let t = *totals(env.config(), Mode::Testing, args)
            .await
            .unwrap()
            .structure()
            .unwrap();
        assert_eq!(t.total_hours, amt("10"));
        assert_eq!(t.total_earnings, amt("80"));
        assert_eq!(t.total_payments_local, amt("950000"));
        assert_eq!(t.total_payments_earnings_currency, amt("18"));
        assert_eq!(t.balance_earnings_currency, amt("62"));
        assert_eq!(t.balance_local, amt("3720000"));
    }

    #[tokio::test]
    async fn test_totals_with_sync() {
        let env = TestEnv::new().await;
        let args = TotalsArgs {
            exchange_rate: None,
            sync: true,
        };
        let t = *totals(env.config(), Mode::Testing, args)
            .await
            .unwrap()
            .structure()
            .unwrap();
        assert_eq!(t.total_hours, amt("9.5"));
        assert_eq!(t.total_earnings, amt("77.14"));
        assert_eq!(t.balance_local, Amount::ZERO);
    }

    #[tokio::test]
    async fn test_failed_sync_uses_stored_rows() {
        let env = TestEnv::new().await;
        env.insert_work_log("Feature work", "2", "10").await;
        // Live mode with no report_url configured, so the sync fails.
        let args = TotalsArgs {
            exchange_rate: None,
            sync: true,
        };
        let out = totals(env.config(), Mode::Live, args).await.unwrap();
        assert_eq!(out.structure().unwrap().total_earnings, amt("20"));
    }

    #[tokio::test]
    async fn test_negative_rate_is_rejected() {
        let env = TestEnv::new().await;
        let args = TotalsArgs {
            exchange_rate: Some(amt("-1")),
            sync: false,
        };
        let e = totals(env.config(), Mode::Testing, args)
            .await
            .unwrap_err();
        assert_eq!(error_type(&e), Some(ErrorType::Validation));
    }

    #[tokio::test]
    async fn test_summary_in_testing_mode() {
        let env = TestEnv::new().await;
        env.insert_work_log("Feature work", "10", "8").await;
        let out = summary(env.config(), Mode::Testing, SummaryArgs::default())
            .await
            .unwrap();
        let structure = out.structure().unwrap();
        assert_eq!(structure.totals.total_earnings, amt("80"));
        assert_eq!(out.message(), structure.summary.summary);
        assert!(out.message().contains("still owed"));
    }

    #[tokio::test]
    async fn test_summary_falls_back_without_api_key() {
        let env = TestEnv::new().await;
        if std::env::var("GEMINI_API_KEY").is_ok() {
            return;
        }
        let out = summary(env.config(), Mode::Live, SummaryArgs::default())
            .await
            .unwrap();
        assert_eq!(out.message(), FALLBACK_SUMMARY);
    }
}
