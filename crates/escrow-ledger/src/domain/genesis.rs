//! Initial ledger population: accounts with opening balances and assets
//! already bound to their owners.

use crate::domain::entities::{Account, Asset};
use crate::domain::errors::LedgerError;
use crate::domain::{accounts, assets};
use crate::ports::LedgerStore;
use serde::{Deserialize, Serialize};
use tracing::info;

/// An account to create at install time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSeed {
    pub id: String,
    pub name: String,
    pub balance: u64,
}

/// An asset to create at install time, unencumbered.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetSeed {
    pub id: String,
    pub owner: String,
}

/// Write the seed records into an empty store.
///
/// Every asset owner must appear among the seeded accounts; seeding is
/// rejected before the first write otherwise.
pub fn install<S: LedgerStore>(
    store: &S,
    account_seeds: &[AccountSeed],
    asset_seeds: &[AssetSeed],
) -> Result<(), LedgerError> {
    for asset in asset_seeds {
        if !account_seeds.iter().any(|a| a.id == asset.owner) {
            return Err(LedgerError::invalid_argument(format!(
                "asset {} is owned by unseeded account {}",
                asset.id, asset.owner
            )));
        }
    }

    for seed in account_seeds {
        accounts::save(
            store,
            &Account {
                id: seed.id.clone(),
                name: seed.name.clone(),
                balance: seed.balance,
            },
        )?;
    }
    for seed in asset_seeds {
        assets::save(
            store,
            &Asset {
                id: seed.id.clone(),
                owner: seed.owner.clone(),
                encumbrance: false,
            },
        )?;
    }

    info!(
        accounts = account_seeds.len(),
        assets = asset_seeds.len(),
        "ledger seeded"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryLedgerStore;
    use crate::domain::entities::RESERVED_ACCOUNT_NAME;

    fn seeds() -> (Vec<AccountSeed>, Vec<AssetSeed>) {
        let accounts = vec![
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
        ];
        let assets = vec![AssetSeed {
            id: "x".into(),
            owner: "alice".into(),
        }];
        (accounts, assets)
    }

    #[test]
    fn test_install_writes_all_seeds() {
        let store = InMemoryLedgerStore::new();
        let (account_seeds, asset_seeds) = seeds();
        install(&store, &account_seeds, &asset_seeds).unwrap();

        assert_eq!(accounts::list(&store, &[]).unwrap().len(), 2);
        let asset = assets::get_owned_exactly(&store, "alice", "x").unwrap();
        assert!(!asset.encumbrance);
    }

    #[test]
    fn test_install_rejects_unseeded_owner() {
        let store = InMemoryLedgerStore::new();
        let (account_seeds, _) = seeds();
        let orphan = vec![AssetSeed {
            id: "y".into(),
            owner: "nobody".into(),
        }];
        let err = install(&store, &account_seeds, &orphan).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidArgument { .. }));
        assert!(accounts::list(&store, &[]).unwrap().is_empty());
    }
}
