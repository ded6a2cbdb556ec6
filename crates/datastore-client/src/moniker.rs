//! Deferred reads through monikers.

use datastore_core::records::{Moniker, PublishedCondition, PublishedMeasurement};
use datastore_core::Value;
use datastore_proto::convert::{read, ConversionError};
use datastore_proto::monikers;

use crate::error::{ClientError, Result};
use crate::service::MonikerService;

/// Anything that can name the stored data to read.
pub trait MonikerSource {
    /// The moniker, or [`ClientError::MissingMoniker`] if there is none.
    fn moniker(&self) -> Result<&Moniker>;
}

impl MonikerSource for Moniker {
    fn moniker(&self) -> Result<&Moniker> {
        Ok(self)
    }
}

impl MonikerSource for PublishedMeasurement {
    fn moniker(&self) -> Result<&Moniker> {
        self.moniker
            .as_ref()
            .ok_or(ClientError::MissingMoniker("PublishedMeasurement"))
    }
}

impl MonikerSource for PublishedCondition {
    fn moniker(&self) -> Result<&Moniker> {
        self.moniker
            .as_ref()
            .ok_or(ClientError::MissingMoniker("PublishedCondition"))
    }
}

/// Fetch the value behind `moniker` and rebuild it as a native value.
pub async fn read_from_moniker(service: &dyn MonikerService, moniker: &Moniker) -> Result<Value> {
    tracing::debug!(%moniker, "Reading from moniker");
    let result = service
        .read_from_moniker(monikers::Moniker::from(moniker))
        .await?;
    let any = result
        .value
        .ok_or(ConversionError::MissingPayload("ReadFromMonikerResult.value"))?;
    Ok(read::from_any(&any)?)
}
