//! Named-operation entry point
//!
//! Routes an operation name and its text arguments to the matching
//! [`SettlementService`] method and encodes the result as JSON. Queries
//! return a list of records; invocations return the record they wrote.

use common::parse_u64;
use observability::OperationMetricsGuard;
use serde::Serialize;
use tracing::{debug, warn};

use crate::identity::IdentityProvider;
use crate::operation::Operation;
use crate::service::SettlementService;
use crate::Result;

/// Run one operation by name
pub async fn dispatch(
    service: &SettlementService,
    identity: &dyn IdentityProvider,
    function: &str,
    args: &[String],
) -> Result<Vec<u8>> {
    let operation: Operation = function.parse()?;
    let mut guard = OperationMetricsGuard::new(service.metrics(), operation.name());

    let result = invoke(service, identity, operation, args).await;
    match &result {
        Ok(payload) => debug!(
            operation = operation.name(),
            response = %String::from_utf8_lossy(payload),
            "Operation completed"
        ),
        Err(e) => {
            guard.set_error(e.kind().as_str());
            warn!(operation = operation.name(), kind = %e.kind(), error = %e, "Operation rejected");
        }
    }
    result
}

async fn invoke(
    service: &SettlementService,
    identity: &dyn IdentityProvider,
    operation: Operation,
    args: &[String],
) -> Result<Vec<u8>> {
    operation.check_arity(args.len())?;

    match operation {
        Operation::Sell => {
            let volume = parse_u64("volume", &args[3])?;
            encode(&service.sell(identity, &args[0], &args[1], &args[2], volume).await?)
        }
        Operation::ConfirmBuy => {
            let transaction_id = parse_u64("transactionID", &args[0])?;
            encode(&service.confirm_buy(identity, transaction_id).await?)
        }
        Operation::Cancel => {
            let transaction_id = parse_u64("transactionID", &args[0])?;
            encode(&service.cancel(identity, transaction_id).await?)
        }
        Operation::IssueStock => {
            let volume = parse_u64("volume", &args[2])?;
            encode(&service.issue_stock(identity, &args[0], &args[1], volume).await?)
        }
        Operation::AddMoney => {
            let amount = parse_u64("amount", &args[1])?;
            encode(&service.add_money(identity, &args[0], amount).await?)
        }
        Operation::SetMaxNumberHolder => {
            let max = parse_u64("maxNumberHolder", &args[1])?;
            encode(&service.set_max_number_holder(identity, &args[0], max).await?)
        }
        Operation::GetTransaction => {
            let transaction_id = args
                .first()
                .map(|id| parse_u64("transactionID", id))
                .transpose()?;
            encode(&service.get_transaction(identity, transaction_id).await?)
        }
        Operation::GetBalance => encode(&service.get_balance(identity).await?),
        Operation::GetMoney => encode(&service.get_money(identity).await?),
        Operation::FindUnconfirmedTransaction => {
            encode(&service.find_unconfirmed_transactions(identity).await?)
        }
        Operation::FindCompletedTransaction => {
            encode(&service.find_completed_transactions(identity).await?)
        }
        Operation::FindConfirmedTransactionBySymbol => encode(
            &service
                .find_confirmed_transactions_by_symbol(identity, &args[0])
                .await?,
        ),
        Operation::GetHolders => encode(&service.get_holders(identity, &args[0]).await?),
        Operation::GetMaxNumberHolder => {
            encode(&service.get_max_number_holder(identity, &args[0]).await?)
        }
    }
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{bot, issuer, service, trader};
    use crate::{ErrorKind, SettlementError, StaticIdentity};
    use assert_matches::assert_matches;
    use serde_json::Value;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    async fn call(
        service: &SettlementService,
        identity: &StaticIdentity,
        function: &str,
        list: &[&str],
    ) -> Result<Value> {
        let payload = dispatch(service, identity, function, &args(list)).await?;
        Ok(serde_json::from_slice(&payload).unwrap())
    }

    #[tokio::test]
    async fn test_trade_through_dispatch() {
        let service = service().await;
        let sold = call(&service, &trader("A01"), "sell", &["AAAA", "A02", "5", "10"])
            .await
            .unwrap();
        assert_eq!(sold["TransactionID"], 1);
        assert_eq!(sold["Status"], "Waiting");

        let waiting = call(&service, &trader("A02"), "findUnconfirmedTransaction", &[])
            .await
            .unwrap();
        assert_eq!(waiting.as_array().unwrap().len(), 1);

        let confirmed = call(&service, &trader("A02"), "confirmBuy", &["1"])
            .await
            .unwrap();
        assert_eq!(confirmed["Status"], "Confirmed");

        let money = call(&service, &trader("A02"), "getMoney", &[]).await.unwrap();
        assert_eq!(money, serde_json::json!([{ "AccountID": "A02", "Amount": 950 }]));

        let balance = call(&service, &trader("A02"), "getBalance", &[]).await.unwrap();
        assert_eq!(
            balance,
            serde_json::json!([{ "AccountID": "A02", "Symbol": "AAAA", "Balance": 10 }])
        );
    }

    #[tokio::test]
    async fn test_queries_return_lists() {
        let service = service().await;
        let profile = call(&service, &trader("A01"), "getMaxNumberHolder", &["AAAA"])
            .await
            .unwrap();
        assert_eq!(
            profile,
            serde_json::json!([{ "Symbol": "AAAA", "MaxNumberHolder": 3 }])
        );

        let none = call(&service, &trader("A01"), "getTransaction", &[])
            .await
            .unwrap();
        assert_eq!(none, serde_json::json!([]));

        let holders = call(&service, &issuer("A04"), "getHolders", &["BBBB"])
            .await
            .unwrap();
        assert_eq!(holders.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_invocations() {
        let service = service().await;
        let funded = call(&service, &bot(), "addMoney", &["A09", "250"])
            .await
            .unwrap();
        assert_eq!(funded["Amount"], 250);

        let tsd = StaticIdentity::new("TSD", "tsd");
        let minted = call(&service, &tsd, "issueStock", &["A09", "DDDD", "40"])
            .await
            .unwrap();
        assert_eq!(minted["Balance"], 40);

        let profile = call(&service, &tsd, "setMaxNumberHolder", &["DDDD", "4"])
            .await
            .unwrap();
        assert_eq!(profile["MaxNumberHolder"], 4);

        call(&service, &trader("A09"), "sell", &["DDDD", "A01", "3", "40"])
            .await
            .unwrap();
        let cancelled = call(&service, &trader("A01"), "cancel", &["1"])
            .await
            .unwrap();
        assert_eq!(cancelled["Status"], "CancelledByBuyer");

        let completed = call(&service, &trader("A09"), "findCompletedTransaction", &[])
            .await
            .unwrap();
        assert_eq!(completed[0]["Status"], "CancelledByBuyer");
    }

    #[tokio::test]
    async fn test_validation_before_store() {
        let service = service().await;
        let seller = trader("A01");

        let err = call(&service, &seller, "buy", &[]).await.unwrap_err();
        assert_matches!(err, SettlementError::UnknownOperation(_));

        let err = call(&service, &seller, "sell", &["AAAA", "A02", "5"])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = call(&service, &seller, "sell", &["AAAA", "A02", "5", "-3"])
            .await
            .unwrap_err();
        assert_matches!(err, SettlementError::InvalidArgument(_));

        let err = call(&service, &seller, "confirmBuy", &["1x"])
            .await
            .unwrap_err();
        assert_matches!(err, SettlementError::InvalidArgument(_));

        let err = call(&service, &seller, "getTransaction", &["1", "2"])
            .await
            .unwrap_err();
        assert_matches!(err, SettlementError::ArgumentCount { got: 2, .. });

        assert!(service
            .get_transaction(&seller, None)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_errors_keep_their_kind() {
        let service = service().await;
        let err = call(&service, &bot(), "getMoney", &[]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);

        let err = call(&service, &trader("A01"), "confirmBuy", &["42"])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
