//! # Escrow Ledger Service
//!
//! Inbound surface of the crate: a flat `(operation name, string args)`
//! invocation is parsed into a typed [`Request`], dispatched against the
//! store, and answered with a JSON-serializable [`Response`].
//!
//! Parsing is closed over the operation set. An unknown name or a wrong
//! argument count fails before any domain code runs, so a malformed
//! invocation can never leave partial writes.

use crate::domain::entities::{
    Account, Asset, Donating, DonatingByGrantee, Selling, SellingByBuyer,
};
use crate::domain::errors::LedgerError;
use crate::domain::keys::EntityTag;
use crate::domain::selling::SettleRecord;
use crate::domain::{accounts, assets, donating, selling};
use crate::ports::{LedgerStore, TxContext};
use serde::Serialize;
use tracing::{debug, info};

/// A parsed, arity-checked invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    CreateAsset {
        operator: String,
        owner: String,
    },
    CreateSelling {
        asset_id: String,
        seller: String,
        price: String,
        period: String,
    },
    CreateSellingByBuy {
        asset_id: String,
        seller: String,
        buyer: String,
    },
    UpdateSelling {
        asset_id: String,
        seller: String,
        buyer: String,
        status: String,
    },
    QuerySellingList {
        prefix: Vec<String>,
    },
    QuerySellingListByBuyer {
        buyer: String,
    },
    CreateDonating {
        asset_id: String,
        donor: String,
        grantee: String,
    },
    UpdateDonating {
        asset_id: String,
        donor: String,
        grantee: String,
        status: String,
    },
    QueryDonatingList {
        prefix: Vec<String>,
    },
    QueryDonatingListByGrantee {
        grantee: String,
    },
    QueryAccountList {
        prefix: Vec<String>,
    },
    QueryAssetList {
        prefix: Vec<String>,
    },
}

impl Request {
    /// Parse an operation name and its flat argument list.
    ///
    /// Mutations take an exact argument count; list queries accept any
    /// prefix of the key's attribute tuple, by-party queries exactly the
    /// party.
    pub fn parse(name: &str, args: &[String]) -> Result<Self, LedgerError> {
        match name {
            "createAsset" => {
                let [operator, owner] = exact_args(name, args)?;
                Ok(Self::CreateAsset { operator, owner })
            }
            "createSelling" => {
                let [asset_id, seller, price, period] = exact_args(name, args)?;
                Ok(Self::CreateSelling {
                    asset_id,
                    seller,
                    price,
                    period,
                })
            }
            "createSellingByBuy" => {
                let [asset_id, seller, buyer] = exact_args(name, args)?;
                Ok(Self::CreateSellingByBuy {
                    asset_id,
                    seller,
                    buyer,
                })
            }
            "updateSelling" => {
                let [asset_id, seller, buyer, status] = exact_args(name, args)?;
                Ok(Self::UpdateSelling {
                    asset_id,
                    seller,
                    buyer,
                    status,
                })
            }
            "querySellingList" => Ok(Self::QuerySellingList {
                prefix: prefix_args(name, args, EntityTag::Selling)?,
            }),
            "querySellingListByBuyer" => {
                let [buyer] = exact_args(name, args)?;
                Ok(Self::QuerySellingListByBuyer { buyer })
            }
            "createDonating" => {
                let [asset_id, donor, grantee] = exact_args(name, args)?;
                Ok(Self::CreateDonating {
                    asset_id,
                    donor,
                    grantee,
                })
            }
            "updateDonating" => {
                let [asset_id, donor, grantee, status] = exact_args(name, args)?;
                Ok(Self::UpdateDonating {
                    asset_id,
                    donor,
                    grantee,
                    status,
                })
            }
            "queryDonatingList" => Ok(Self::QueryDonatingList {
                prefix: prefix_args(name, args, EntityTag::Donating)?,
            }),
            "queryDonatingListByGrantee" => {
                let [grantee] = exact_args(name, args)?;
                Ok(Self::QueryDonatingListByGrantee { grantee })
            }
            "queryAccountList" => Ok(Self::QueryAccountList {
                prefix: prefix_args(name, args, EntityTag::Account)?,
            }),
            "queryAssetList" => Ok(Self::QueryAssetList {
                prefix: prefix_args(name, args, EntityTag::Asset)?,
            }),
            other => Err(LedgerError::invalid_argument(format!(
                "unknown operation: {other}"
            ))),
        }
    }
}

fn exact_args<const N: usize>(name: &str, args: &[String]) -> Result<[String; N], LedgerError> {
    let args: [String; N] = args.to_vec().try_into().map_err(|_| {
        LedgerError::invalid_argument(format!(
            "{name} takes {N} arguments, got {}",
            args.len()
        ))
    })?;
    Ok(args)
}

fn prefix_args(name: &str, args: &[String], tag: EntityTag) -> Result<Vec<String>, LedgerError> {
    if args.len() > tag.arity() {
        return Err(LedgerError::invalid_argument(format!(
            "{name} takes at most {} arguments, got {}",
            tag.arity(),
            args.len()
        )));
    }
    Ok(args.to_vec())
}

/// Result of a dispatched request, serialized untagged: single records and
/// lists come out as their plain JSON forms.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Response {
    Asset(Asset),
    Selling(Selling),
    SellingReceipt(SellingByBuyer),
    Settled(SettleRecord),
    Donation(DonatingByGrantee),
    Accounts(Vec<Account>),
    Assets(Vec<Asset>),
    Sellings(Vec<Selling>),
    SellingReceipts(Vec<SellingByBuyer>),
    Donatings(Vec<Donating>),
    Donations(Vec<DonatingByGrantee>),
}

impl Response {
    pub fn to_bytes(&self) -> Result<Vec<u8>, LedgerError> {
        serde_json::to_vec(self).map_err(|e| LedgerError::serialization(e.to_string()))
    }
}

/// Execute one parsed request against the store.
pub fn dispatch<S: LedgerStore>(
    store: &S,
    ctx: &TxContext,
    request: Request,
) -> Result<Response, LedgerError> {
    debug!(tx = %ctx.tx_id(), ?request, "dispatching");
    match request {
        Request::CreateAsset { operator, owner } => {
            let asset = assets::register(store, ctx, &operator, &owner)?;
            info!(tx = %ctx.tx_id(), asset = %asset.id, owner = %owner, "asset created");
            Ok(Response::Asset(asset))
        }
        Request::CreateSelling {
            asset_id,
            seller,
            price,
            period,
        } => {
            let listing = selling::create(store, ctx, &asset_id, &seller, &price, &period)?;
            info!(tx = %ctx.tx_id(), asset = %asset_id, seller = %seller, "sale listed");
            Ok(Response::Selling(listing))
        }
        Request::CreateSellingByBuy {
            asset_id,
            seller,
            buyer,
        } => {
            let receipt = selling::purchase(store, ctx, &asset_id, &seller, &buyer)?;
            info!(tx = %ctx.tx_id(), asset = %asset_id, buyer = %buyer, "purchase accepted");
            Ok(Response::SellingReceipt(receipt))
        }
        Request::UpdateSelling {
            asset_id,
            seller,
            buyer,
            status,
        } => {
            let record = selling::settle(store, &asset_id, &seller, &buyer, &status)?;
            info!(tx = %ctx.tx_id(), asset = %asset_id, status = %status, "sale settled");
            Ok(Response::Settled(record))
        }
        Request::QuerySellingList { prefix } => {
            Ok(Response::Sellings(selling::list(store, &prefix)?))
        }
        Request::QuerySellingListByBuyer { buyer } => Ok(Response::SellingReceipts(
            selling::list_by_buyer(store, &buyer)?,
        )),
        Request::CreateDonating {
            asset_id,
            donor,
            grantee,
        } => {
            let grant = donating::create(store, ctx, &asset_id, &donor, &grantee)?;
            info!(tx = %ctx.tx_id(), asset = %asset_id, grantee = %grantee, "donation offered");
            Ok(Response::Donation(grant))
        }
        Request::UpdateDonating {
            asset_id,
            donor,
            grantee,
            status,
        } => {
            let grant = donating::resolve(store, &asset_id, &donor, &grantee, &status)?;
            info!(tx = %ctx.tx_id(), asset = %asset_id, status = %status, "donation resolved");
            Ok(Response::Donation(grant))
        }
        Request::QueryDonatingList { prefix } => {
            Ok(Response::Donatings(donating::list(store, &prefix)?))
        }
        Request::QueryDonatingListByGrantee { grantee } => Ok(Response::Donations(
            donating::list_by_grantee(store, &grantee)?,
        )),
        Request::QueryAccountList { prefix } => {
            Ok(Response::Accounts(accounts::list(store, &prefix)?))
        }
        Request::QueryAssetList { prefix } => Ok(Response::Assets(assets::list(store, &prefix)?)),
    }
}

/// Parse, dispatch and serialize in one call.
pub fn invoke<S: LedgerStore>(
    store: &S,
    ctx: &TxContext,
    name: &str,
    args: &[String],
) -> Result<Vec<u8>, LedgerError> {
    let request = Request::parse(name, args)?;
    dispatch(store, ctx, request)?.to_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryLedgerStore;
    use crate::domain::genesis::{self, AccountSeed, AssetSeed};
    use crate::domain::RESERVED_ACCOUNT_NAME;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| (*s).to_owned()).collect()
    }

    fn ctx(n: u64) -> TxContext {
        TxContext::new(n, format!("tx-{n}"))
    }

    fn seeded_store() -> InMemoryLedgerStore {
        let store = InMemoryLedgerStore::new();
        genesis::install(
            &store,
            &[
                AccountSeed {
                    id: "mgr".into(),
                    name: RESERVED_ACCOUNT_NAME.into(),
                    balance: 0,
                },
                AccountSeed {
                    id: "alice".into(),
                    name: "alice".into(),
                    balance: 1000,
                },
                AccountSeed {
                    id: "bob".into(),
                    name: "bob".into(),
                    balance: 500,
                },
            ],
            &[AssetSeed {
                id: "x".into(),
                owner: "alice".into(),
            }],
        )
        .unwrap();
        store
    }

    #[test]
    fn test_parse_rejects_unknown_operation() {
        let err = Request::parse("mintGold", &args(&["a"])).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidArgument { .. }));
    }

    #[test]
    fn test_parse_rejects_wrong_arity() {
        let err = Request::parse("createSelling", &args(&["x", "alice"])).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidArgument { .. }));

        let err =
            Request::parse("querySellingListByBuyer", &args(&["bob", "extra"])).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidArgument { .. }));
    }

    #[test]
    fn test_parse_query_prefix_is_bounded_by_arity() {
        // Selling keys carry two attributes; three is over.
        let err = Request::parse("querySellingList", &args(&["a", "b", "c"])).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidArgument { .. }));

        let req = Request::parse("querySellingList", &[]).unwrap();
        assert_eq!(req, Request::QuerySellingList { prefix: vec![] });
    }

    #[test]
    fn test_full_sale_through_dispatch() {
        let store = seeded_store();

        let req = Request::parse("createSelling", &args(&["x", "alice", "100", "3600"])).unwrap();
        dispatch(&store, &ctx(1), req).unwrap();

        let req = Request::parse("createSellingByBuy", &args(&["x", "alice", "bob"])).unwrap();
        dispatch(&store, &ctx(2), req).unwrap();

        let req = Request::parse("updateSelling", &args(&["x", "alice", "bob", "done"])).unwrap();
        let response = dispatch(&store, &ctx(3), req).unwrap();
        let Response::Settled(SettleRecord::Receipt(receipt)) = response else {
            panic!("expected a settled receipt");
        };
        assert_eq!(receipt.selling.buyer, "bob");

        let accounts = match dispatch(
            &store,
            &ctx(4),
            Request::parse("queryAccountList", &[]).unwrap(),
        )
        .unwrap()
        {
            Response::Accounts(accounts) => accounts,
            other => panic!("expected accounts, got {other:?}"),
        };
        let balance_of = |id: &str| accounts.iter().find(|a| a.id == id).unwrap().balance;
        assert_eq!(balance_of("alice"), 1100);
        assert_eq!(balance_of("bob"), 400);
    }

    #[test]
    fn test_create_asset_requires_reserved_operator() {
        let store = seeded_store();
        let req = Request::parse("createAsset", &args(&["alice", "bob"])).unwrap();
        let err = dispatch(&store, &ctx(1), req).unwrap_err();
        assert!(matches!(err, LedgerError::PolicyViolation { .. }));

        let req = Request::parse("createAsset", &args(&["mgr", "bob"])).unwrap();
        let Response::Asset(asset) = dispatch(&store, &ctx(2), req).unwrap() else {
            panic!("expected an asset");
        };
        assert_eq!(asset.owner, "bob");
        assert_eq!(asset.id, "tx-2");
    }

    #[test]
    fn test_invoke_serializes_untagged() {
        let store = seeded_store();
        let bytes = invoke(&store, &ctx(1), "queryAssetList", &args(&["alice"])).unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(parsed[0]["owner"], "alice");
        assert_eq!(parsed[0]["encumbrance"], false);
    }

    #[test]
    fn test_donation_flow_through_dispatch() {
        let store = seeded_store();

        let req = Request::parse("createDonating", &args(&["x", "alice", "bob"])).unwrap();
        dispatch(&store, &ctx(1), req).unwrap();

        let req = Request::parse("updateDonating", &args(&["x", "alice", "bob", "done"])).unwrap();
        let Response::Donation(grant) = dispatch(&store, &ctx(2), req).unwrap() else {
            panic!("expected a donation record");
        };
        assert_eq!(grant.donating.status.as_str(), "done");

        let req = Request::parse("queryAssetList", &args(&["bob"])).unwrap();
        let Response::Assets(bobs) = dispatch(&store, &ctx(3), req).unwrap() else {
            panic!("expected assets");
        };
        assert_eq!(bobs.len(), 1);
        assert_eq!(bobs[0].id, "x");
    }
}
