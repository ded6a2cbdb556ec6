//! Data store client: publishing, reading and querying measurement data.

use std::fmt;
use std::sync::Arc;

use datastore_core::records::{
    ErrorInformation, Outcome, PublishedCondition, PublishedMeasurement, Step, TestResult,
};
use datastore_core::{BinaryTime, FromValue, Value};
use datastore_proto::convert::records::outcome_to_wire;
use datastore_proto::convert::{publish, ToDomain};
use datastore_proto::data;
use parking_lot::Mutex;

use crate::cache::ConnectionCache;
use crate::config::ClientConfig;
use crate::connection::service_location_key;
use crate::error::{ClientError, Result};
use crate::moniker::{read_from_moniker, MonikerSource};
use crate::service::{DataStoreService, GrpcConnector, MonikerService, ServiceConnector};
use crate::state::ClientState;
use crate::timestamp::reconcile_publish_timestamp;

/// Optional fields of a single measurement publish.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeasurementOptions {
    /// Measurement time; defaults to the waveform's t0 or the current time.
    pub timestamp: Option<BinaryTime>,
    /// Pass/fail outcome.
    pub outcome: Outcome,
    /// Error details when the measurement failed.
    pub error_information: Option<ErrorInformation>,
    /// Associated hardware item ids or aliases.
    pub hardware_item_ids: Vec<String>,
    /// Associated test adapter ids or aliases.
    pub test_adapter_ids: Vec<String>,
    /// Associated software item ids or aliases.
    pub software_item_ids: Vec<String>,
    /// Free-form notes.
    pub notes: String,
}

/// Optional fields of a batch measurement publish.
///
/// `timestamps`, `outcomes` and `error_information` may each be empty, hold
/// one entry applied to every value, or one entry per value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchMeasurementOptions {
    /// Per-iteration timestamps.
    pub timestamps: Vec<BinaryTime>,
    /// Per-iteration outcomes.
    pub outcomes: Vec<Outcome>,
    /// Per-iteration error details.
    pub error_information: Vec<ErrorInformation>,
    /// Associated hardware item ids or aliases.
    pub hardware_item_ids: Vec<String>,
    /// Associated test adapter ids or aliases.
    pub test_adapter_ids: Vec<String>,
    /// Associated software item ids or aliases.
    pub software_item_ids: Vec<String>,
}

struct Inner {
    state: ClientState,
    data_store: Option<Arc<dyn DataStoreService>>,
}

/// Client for the measurement data store.
///
/// The data store connection is created on first use. Reads go to the
/// moniker service named by each moniker; one connection is kept per
/// distinct `host:port`. After [`close`](Self::close) every operation fails
/// with [`ClientError::ClientClosed`].
pub struct DataStoreClient {
    connector: Arc<dyn ServiceConnector>,
    inner: Mutex<Inner>,
    monikers: ConnectionCache<dyn MonikerService>,
}

impl fmt::Debug for DataStoreClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataStoreClient")
            .field("state", &self.inner.lock().state)
            .field("monikers", &self.monikers)
            .finish_non_exhaustive()
    }
}

impl DataStoreClient {
    /// Client using `connector` to reach the services.
    pub fn new(connector: Arc<dyn ServiceConnector>) -> Self {
        Self {
            connector,
            inner: Mutex::new(Inner {
                state: ClientState::Open,
                data_store: None,
            }),
            monikers: ConnectionCache::new(),
        }
    }

    /// Client for the services described by `config`.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Ok(Self::new(Arc::new(GrpcConnector::from_config(config)?)))
    }

    /// Whether [`close`](Self::close) has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.lock().state == ClientState::Closed
    }

    /// Close the client and release its connections. Idempotent.
    pub fn close(&self) {
        let mut inner = self.inner.lock();
        if inner.state.close() {
            inner.data_store = None;
            let released = self.monikers.clear();
            tracing::debug!(released, "Data store client closed");
        }
    }

    fn ensure_open(&self) -> Result<()> {
        self.inner.lock().state.ensure_open()
    }

    fn data_store(&self) -> Result<Arc<dyn DataStoreService>> {
        let mut inner = self.inner.lock();
        inner.state.ensure_open()?;
        if let Some(service) = &inner.data_store {
            return Ok(Arc::clone(service));
        }
        let service = self.connector.data_store()?;
        inner.data_store = Some(Arc::clone(&service));
        Ok(service)
    }

    fn moniker_service(&self, service_location: &str) -> Result<Arc<dyn MonikerService>> {
        let inner = self.inner.lock();
        inner.state.ensure_open()?;
        let key = service_location_key(service_location)?;
        self.monikers
            .get_or_create(&key, || self.connector.moniker_service(&key))
    }

    /// Publish a single condition value (a bare primitive or a [`Scalar`](datastore_core::Scalar)).
    pub async fn publish_condition(
        &self,
        condition_name: &str,
        condition_type: &str,
        value: impl Into<Value>,
        step_id: &str,
    ) -> Result<PublishedCondition> {
        self.ensure_open()?;
        let value = value.into();
        let request = data::PublishConditionRequest {
            condition_name: condition_name.to_string(),
            r#type: condition_type.to_string(),
            step_id: step_id.to_string(),
            value: Some(publish::condition_value(&value)?),
        };
        let response = self.data_store()?.publish_condition(request).await?;
        Ok(response
            .published_condition
            .map(ToDomain::to_domain)
            .unwrap_or_default())
    }

    /// Publish a condition swept over several values.
    ///
    /// `values` is a [`Vector`](datastore_core::Vector) or a non-empty
    /// sequence of one primitive kind.
    pub async fn publish_condition_batch(
        &self,
        condition_name: &str,
        condition_type: &str,
        values: impl Into<Value>,
        step_id: &str,
    ) -> Result<PublishedCondition> {
        self.ensure_open()?;
        let values = values.into();
        let request = data::PublishConditionBatchRequest {
            condition_name: condition_name.to_string(),
            r#type: condition_type.to_string(),
            step_id: step_id.to_string(),
            scalar_values: Some(publish::condition_batch_values(&values)?),
        };
        let response = self.data_store()?.publish_condition_batch(request).await?;
        Ok(response
            .published_condition
            .map(ToDomain::to_domain)
            .unwrap_or_default())
    }

    /// Publish a single measurement of any supported kind.
    ///
    /// The timestamp sent is the explicit one, the waveform's own t0, or the
    /// current time; a waveform t0 that disagrees with an explicit timestamp
    /// is rejected before anything is sent.
    pub async fn publish_measurement(
        &self,
        measurement_name: &str,
        value: impl Into<Value>,
        step_id: &str,
        options: MeasurementOptions,
    ) -> Result<PublishedMeasurement> {
        self.ensure_open()?;
        let value = value.into();
        let payload = publish::measurement_value(&value)?;
        let timestamp = reconcile_publish_timestamp(&value, options.timestamp, BinaryTime::now)?;
        let request = data::PublishMeasurementRequest {
            measurement_name: measurement_name.to_string(),
            step_id: step_id.to_string(),
            timestamp: Some(timestamp.into()),
            outcome: outcome_to_wire(options.outcome),
            error_information: options.error_information.as_ref().map(Into::into),
            hardware_item_ids: options.hardware_item_ids,
            test_adapter_ids: options.test_adapter_ids,
            software_item_ids: options.software_item_ids,
            notes: options.notes,
            value: Some(payload),
        };
        let response = self.data_store()?.publish_measurement(request).await?;
        Ok(response
            .published_measurement
            .map(ToDomain::to_domain)
            .unwrap_or_default())
    }

    /// Publish a scalar measurement swept over several values.
    ///
    /// Returns one record per measurement the service reports.
    pub async fn publish_measurement_batch(
        &self,
        measurement_name: &str,
        values: impl Into<Value>,
        step_id: &str,
        options: BatchMeasurementOptions,
    ) -> Result<Vec<PublishedMeasurement>> {
        self.ensure_open()?;
        let values = values.into();
        let request = data::PublishMeasurementBatchRequest {
            measurement_name: measurement_name.to_string(),
            step_id: step_id.to_string(),
            timestamp: options.timestamps.into_iter().map(Into::into).collect(),
            scalar_values: Some(publish::measurement_batch_values(&values)?),
            outcome: options.outcomes.into_iter().map(outcome_to_wire).collect(),
            error_information: options.error_information.iter().map(Into::into).collect(),
            hardware_item_ids: options.hardware_item_ids,
            test_adapter_ids: options.test_adapter_ids,
            software_item_ids: options.software_item_ids,
        };
        let response = self.data_store()?.publish_measurement_batch(request).await?;
        Ok(response
            .published_measurements
            .into_iter()
            .map(ToDomain::to_domain)
            .collect())
    }

    /// Read the value behind a moniker or a published record.
    pub async fn read_data<S: MonikerSource + ?Sized>(&self, source: &S) -> Result<Value> {
        self.ensure_open()?;
        let moniker = source.moniker()?;
        let service = self.moniker_service(&moniker.service_location)?;
        read_from_moniker(service.as_ref(), moniker).await
    }

    /// Read and check the value's kind.
    ///
    /// Fails with [`ClientError::ExpectedTypeMismatch`] when the stored value
    /// is not a `T`.
    pub async fn read_data_as<T: FromValue, S: MonikerSource + ?Sized>(
        &self,
        source: &S,
    ) -> Result<T> {
        self.ensure_open()?;
        let value = self.read_data(source).await?;
        T::from_value(value).map_err(|actual| ClientError::ExpectedTypeMismatch {
            expected: T::EXPECTED,
            actual: actual.describe(),
        })
    }

    /// Create a step, returning its id.
    pub async fn create_step(&self, step: &Step) -> Result<String> {
        self.ensure_open()?;
        let request = data::CreateStepRequest {
            step: Some(step.into()),
        };
        Ok(self.data_store()?.create_step(request).await?.step_id)
    }

    /// Fetch a step by id.
    pub async fn get_step(&self, step_id: &str) -> Result<Step> {
        self.ensure_open()?;
        let request = data::GetStepRequest {
            step_id: step_id.to_string(),
        };
        let response = self.data_store()?.get_step(request).await?;
        Ok(response.step.map(ToDomain::to_domain).unwrap_or_default())
    }

    /// Create a test result, returning its id.
    pub async fn create_test_result(&self, test_result: &TestResult) -> Result<String> {
        self.ensure_open()?;
        let request = data::CreateTestResultRequest {
            test_result: Some(test_result.into()),
        };
        Ok(self
            .data_store()?
            .create_test_result(request)
            .await?
            .test_result_id)
    }

    /// Fetch a test result by id.
    pub async fn get_test_result(&self, test_result_id: &str) -> Result<TestResult> {
        self.ensure_open()?;
        let request = data::GetTestResultRequest {
            test_result_id: test_result_id.to_string(),
        };
        let response = self.data_store()?.get_test_result(request).await?;
        Ok(response
            .test_result
            .map(ToDomain::to_domain)
            .unwrap_or_default())
    }

    /// Conditions matching an OData query.
    pub async fn query_conditions(&self, odata_query: &str) -> Result<Vec<PublishedCondition>> {
        self.ensure_open()?;
        let request = data::QueryConditionsRequest {
            odata_query: odata_query.to_string(),
        };
        let response = self.data_store()?.query_conditions(request).await?;
        Ok(response
            .published_conditions
            .into_iter()
            .map(ToDomain::to_domain)
            .collect())
    }

    /// Measurements matching an OData query.
    pub async fn query_measurements(
        &self,
        odata_query: &str,
    ) -> Result<Vec<PublishedMeasurement>> {
        self.ensure_open()?;
        let request = data::QueryMeasurementsRequest {
            odata_query: odata_query.to_string(),
        };
        let response = self.data_store()?.query_measurements(request).await?;
        Ok(response
            .published_measurements
            .into_iter()
            .map(ToDomain::to_domain)
            .collect())
    }

    /// Test results matching an OData query.
    pub async fn query_test_results(&self, odata_query: &str) -> Result<Vec<TestResult>> {
        self.ensure_open()?;
        let request = data::QueryTestResultsRequest {
            odata_query: odata_query.to_string(),
        };
        let response = self.data_store()?.query_test_results(request).await?;
        Ok(response
            .test_results
            .into_iter()
            .map(ToDomain::to_domain)
            .collect())
    }

    /// Steps matching an OData query.
    pub async fn query_steps(&self, odata_query: &str) -> Result<Vec<Step>> {
        self.ensure_open()?;
        let request = data::QueryStepsRequest {
            odata_query: odata_query.to_string(),
        };
        let response = self.data_store()?.query_steps(request).await?;
        Ok(response.steps.into_iter().map(ToDomain::to_domain).collect())
    }
}

impl Drop for DataStoreClient {
    fn drop(&mut self) {
        self.close();
    }
}
