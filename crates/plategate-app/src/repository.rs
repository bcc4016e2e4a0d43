//! Repository adapters for persistence layer

use plategate_infra::persistence::CsvVisitLedger;
use plategate_types::Result;

use crate::config::Config;

/// Open the shared visit ledger named in the config
pub fn open_ledger(config: &Config) -> Result<CsvVisitLedger> {
    CsvVisitLedger::open_with_options(&config.ledger.path, config.ledger_options())
        .map_err(Into::into)
}
