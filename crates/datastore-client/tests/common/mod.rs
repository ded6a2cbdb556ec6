//! In-process mock services shared by the client integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use datastore_client::service::{
    DataStoreService, MetadataStoreService, MonikerService, ServiceConnector,
};
use datastore_client::Result;
use datastore_proto::data::publish_measurement_request::Value as MeasurementPayload;
use datastore_proto::{data, metadata, monikers, pack, type_names};
use parking_lot::Mutex;
use prost_types::Any;
use tonic::Status;

pub const SERVICE_LOCATION: &str = "http://localhost:50051";

/// Wrap a measurement payload the way the store would hand it back.
pub fn payload_to_any(payload: &MeasurementPayload) -> Any {
    match payload {
        MeasurementPayload::Scalar(m) => pack(m, type_names::SCALAR),
        MeasurementPayload::Vector(m) => pack(m, type_names::VECTOR),
        MeasurementPayload::DoubleAnalogWaveform(m) => pack(m, type_names::DOUBLE_ANALOG_WAVEFORM),
        MeasurementPayload::I16AnalogWaveform(m) => pack(m, type_names::I16_ANALOG_WAVEFORM),
        MeasurementPayload::DoubleComplexWaveform(m) => {
            pack(m, type_names::DOUBLE_COMPLEX_WAVEFORM)
        }
        MeasurementPayload::I16ComplexWaveform(m) => pack(m, type_names::I16_COMPLEX_WAVEFORM),
        MeasurementPayload::DoubleSpectrum(m) => pack(m, type_names::DOUBLE_SPECTRUM),
        MeasurementPayload::DigitalWaveform(m) => pack(m, type_names::DIGITAL_WAVEFORM),
        MeasurementPayload::XyData(m) => pack(m, type_names::DOUBLE_XY_DATA),
    }
}

/// Data store that keeps every published payload and serves it by moniker.
#[derive(Default)]
pub struct MockStore {
    pub stored: Mutex<Vec<Any>>,
    pub measurement_requests: Mutex<Vec<data::PublishMeasurementRequest>>,
    pub batch_requests: Mutex<Vec<data::PublishMeasurementBatchRequest>>,
    pub condition_requests: Mutex<Vec<data::PublishConditionRequest>>,
    pub condition_batch_requests: Mutex<Vec<data::PublishConditionBatchRequest>>,
    pub queries: Mutex<Vec<String>>,
    pub steps: Mutex<HashMap<String, data::Step>>,
    pub test_results: Mutex<Vec<data::TestResult>>,
}

impl MockStore {
    fn moniker(&self, instance: usize) -> monikers::Moniker {
        monikers::Moniker {
            service_location: SERVICE_LOCATION.to_string(),
            data_source: "mock".to_string(),
            data_instance: i64::try_from(instance).unwrap(),
        }
    }

    /// Store an arbitrary envelope and return the moniker naming it.
    pub fn insert(&self, any: Any) -> monikers::Moniker {
        let mut stored = self.stored.lock();
        stored.push(any);
        self.moniker(stored.len() - 1)
    }
}

#[async_trait]
impl DataStoreService for MockStore {
    async fn publish_condition(
        &self,
        request: data::PublishConditionRequest,
    ) -> std::result::Result<data::PublishConditionResponse, Status> {
        let condition = data::PublishedCondition {
            id: "condition-1".into(),
            condition_name: request.condition_name.clone(),
            condition_type: request.r#type.clone(),
            step_id: request.step_id.clone(),
            moniker: Some(self.moniker(0)),
            ..Default::default()
        };
        self.condition_requests.lock().push(request);
        Ok(data::PublishConditionResponse {
            published_condition: Some(condition),
        })
    }

    async fn publish_condition_batch(
        &self,
        request: data::PublishConditionBatchRequest,
    ) -> std::result::Result<data::PublishConditionBatchResponse, Status> {
        let condition = data::PublishedCondition {
            condition_name: request.condition_name.clone(),
            ..Default::default()
        };
        self.condition_batch_requests.lock().push(request);
        Ok(data::PublishConditionBatchResponse {
            published_condition: Some(condition),
        })
    }

    async fn publish_measurement(
        &self,
        request: data::PublishMeasurementRequest,
    ) -> std::result::Result<data::PublishMeasurementResponse, Status> {
        let payload = request
            .value
            .as_ref()
            .ok_or_else(|| Status::invalid_argument("missing value"))?;
        let moniker = self.insert(payload_to_any(payload));
        let measurement = data::PublishedMeasurement {
            moniker: Some(moniker),
            name: request.measurement_name.clone(),
            step_id: request.step_id.clone(),
            start_date_time: request.timestamp.clone(),
            outcome: request.outcome,
            ..Default::default()
        };
        self.measurement_requests.lock().push(request);
        Ok(data::PublishMeasurementResponse {
            published_measurement: Some(measurement),
        })
    }

    async fn publish_measurement_batch(
        &self,
        request: data::PublishMeasurementBatchRequest,
    ) -> std::result::Result<data::PublishMeasurementBatchResponse, Status> {
        let values = request
            .scalar_values
            .clone()
            .ok_or_else(|| Status::invalid_argument("missing values"))?;
        let moniker = self.insert(pack(&values, type_names::VECTOR));
        let measurement = data::PublishedMeasurement {
            moniker: Some(moniker),
            name: request.measurement_name.clone(),
            ..Default::default()
        };
        self.batch_requests.lock().push(request);
        Ok(data::PublishMeasurementBatchResponse {
            published_measurements: vec![measurement],
        })
    }

    async fn create_step(
        &self,
        request: data::CreateStepRequest,
    ) -> std::result::Result<data::CreateStepResponse, Status> {
        let mut step = request.step.unwrap_or_default();
        let mut steps = self.steps.lock();
        step.id = format!("step-{}", steps.len() + 1);
        let step_id = step.id.clone();
        steps.insert(step_id.clone(), step);
        Ok(data::CreateStepResponse { step_id })
    }

    async fn get_step(
        &self,
        request: data::GetStepRequest,
    ) -> std::result::Result<data::GetStepResponse, Status> {
        let step = self
            .steps
            .lock()
            .get(&request.step_id)
            .cloned()
            .ok_or_else(|| Status::not_found(request.step_id))?;
        Ok(data::GetStepResponse { step: Some(step) })
    }

    async fn query_steps(
        &self,
        request: data::QueryStepsRequest,
    ) -> std::result::Result<data::QueryStepsResponse, Status> {
        self.queries.lock().push(request.odata_query);
        let mut steps: Vec<_> = self.steps.lock().values().cloned().collect();
        steps.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(data::QueryStepsResponse { steps })
    }

    async fn query_measurements(
        &self,
        request: data::QueryMeasurementsRequest,
    ) -> std::result::Result<data::QueryMeasurementsResponse, Status> {
        self.queries.lock().push(request.odata_query);
        Ok(data::QueryMeasurementsResponse {
            published_measurements: vec![data::PublishedMeasurement {
                name: "Voltage".into(),
                moniker: Some(self.moniker(0)),
                ..Default::default()
            }],
        })
    }

    async fn query_test_results(
        &self,
        request: data::QueryTestResultsRequest,
    ) -> std::result::Result<data::QueryTestResultsResponse, Status> {
        self.queries.lock().push(request.odata_query);
        Ok(data::QueryTestResultsResponse {
            test_results: self.test_results.lock().clone(),
        })
    }
}

#[async_trait]
impl MonikerService for MockStore {
    async fn read_from_moniker(
        &self,
        request: monikers::Moniker,
    ) -> std::result::Result<monikers::ReadFromMonikerResult, Status> {
        let index = usize::try_from(request.data_instance)
            .map_err(|_| Status::invalid_argument("negative data instance"))?;
        let value = self
            .stored
            .lock()
            .get(index)
            .cloned()
            .ok_or_else(|| Status::not_found("no such data instance"))?;
        Ok(monikers::ReadFromMonikerResult { value: Some(value) })
    }
}

/// Metadata store keeping entities in memory.
#[derive(Default)]
pub struct MockMetadata {
    pub uuts: Mutex<Vec<metadata::Uut>>,
    pub operators: Mutex<Vec<metadata::Operator>>,
    pub schemas: Mutex<Vec<String>>,
    pub queries: Mutex<Vec<String>>,
    pub test_adapters: Mutex<Vec<metadata::TestAdapter>>,
    pub tests: Mutex<Vec<metadata::Test>>,
    pub test_descriptions: Mutex<Vec<metadata::TestDescription>>,
    pub alias_requests: Mutex<Vec<metadata::CreateAliasRequest>>,
    pub aliases: Mutex<HashMap<String, metadata::Alias>>,
    pub json_documents: Mutex<Vec<String>>,
}

/// Kind and id of the entity a create-alias request points at.
fn alias_target(
    target: &metadata::create_alias_request::AliasTarget,
) -> (metadata::AliasTargetType, String) {
    use metadata::create_alias_request::AliasTarget as Target;
    use metadata::AliasTargetType as Kind;
    match target {
        Target::UutInstance(e) => (Kind::UutInstance, e.id.clone()),
        Target::Uut(e) => (Kind::Uut, e.id.clone()),
        Target::HardwareItem(e) => (Kind::HardwareItem, e.id.clone()),
        Target::SoftwareItem(e) => (Kind::SoftwareItem, e.id.clone()),
        Target::Operator(e) => (Kind::Operator, e.id.clone()),
        Target::TestDescription(e) => (Kind::TestDescription, e.id.clone()),
        Target::Test(e) => (Kind::Test, e.id.clone()),
        Target::TestAdapter(e) => (Kind::TestAdapter, e.id.clone()),
        Target::TestStation(e) => (Kind::TestStation, e.id.clone()),
    }
}

#[async_trait]
impl MetadataStoreService for MockMetadata {
    async fn create_uut(
        &self,
        request: metadata::CreateUutRequest,
    ) -> std::result::Result<metadata::CreateUutResponse, Status> {
        let mut uut = request.uut.unwrap_or_default();
        let mut uuts = self.uuts.lock();
        uut.id = format!("uut-{}", uuts.len() + 1);
        let uut_id = uut.id.clone();
        uuts.push(uut);
        Ok(metadata::CreateUutResponse { uut_id })
    }

    async fn get_uut(
        &self,
        request: metadata::GetUutRequest,
    ) -> std::result::Result<metadata::GetUutResponse, Status> {
        let uut = self
            .uuts
            .lock()
            .iter()
            .find(|u| u.id == request.uut_id)
            .cloned()
            .ok_or_else(|| Status::not_found(request.uut_id))?;
        Ok(metadata::GetUutResponse { uut: Some(uut) })
    }

    async fn query_uuts(
        &self,
        request: metadata::QueryUutsRequest,
    ) -> std::result::Result<metadata::QueryUutsResponse, Status> {
        self.queries.lock().push(request.odata_query);
        Ok(metadata::QueryUutsResponse {
            uuts: self.uuts.lock().clone(),
        })
    }

    async fn create_operator(
        &self,
        request: metadata::CreateOperatorRequest,
    ) -> std::result::Result<metadata::CreateOperatorResponse, Status> {
        let mut operator = request.operator.unwrap_or_default();
        operator.id = "operator-1".into();
        self.operators.lock().push(operator);
        Ok(metadata::CreateOperatorResponse {
            operator_id: "operator-1".into(),
        })
    }

    async fn create_test_adapter(
        &self,
        request: metadata::CreateTestAdapterRequest,
    ) -> std::result::Result<metadata::CreateTestAdapterResponse, Status> {
        let mut adapter = request.test_adapter.unwrap_or_default();
        let mut adapters = self.test_adapters.lock();
        adapter.id = format!("adapter-{}", adapters.len() + 1);
        let test_adapter_id = adapter.id.clone();
        adapters.push(adapter);
        Ok(metadata::CreateTestAdapterResponse { test_adapter_id })
    }

    async fn query_test_adapters(
        &self,
        request: metadata::QueryTestAdaptersRequest,
    ) -> std::result::Result<metadata::QueryTestAdaptersResponse, Status> {
        self.queries.lock().push(request.odata_query);
        Ok(metadata::QueryTestAdaptersResponse {
            test_adapters: self.test_adapters.lock().clone(),
        })
    }

    async fn create_test(
        &self,
        request: metadata::CreateTestRequest,
    ) -> std::result::Result<metadata::CreateTestResponse, Status> {
        let mut test = request.test.unwrap_or_default();
        let mut tests = self.tests.lock();
        test.id = format!("test-{}", tests.len() + 1);
        let test_id = test.id.clone();
        tests.push(test);
        Ok(metadata::CreateTestResponse { test_id })
    }

    async fn get_test(
        &self,
        request: metadata::GetTestRequest,
    ) -> std::result::Result<metadata::GetTestResponse, Status> {
        let test = self
            .tests
            .lock()
            .iter()
            .find(|t| t.id == request.test_id)
            .cloned()
            .ok_or_else(|| Status::not_found(request.test_id))?;
        Ok(metadata::GetTestResponse { test: Some(test) })
    }

    async fn create_test_description(
        &self,
        request: metadata::CreateTestDescriptionRequest,
    ) -> std::result::Result<metadata::CreateTestDescriptionResponse, Status> {
        let mut description = request.test_description.unwrap_or_default();
        let mut descriptions = self.test_descriptions.lock();
        description.id = format!("description-{}", descriptions.len() + 1);
        let test_description_id = description.id.clone();
        descriptions.push(description);
        Ok(metadata::CreateTestDescriptionResponse {
            test_description_id,
        })
    }

    async fn get_test_description(
        &self,
        request: metadata::GetTestDescriptionRequest,
    ) -> std::result::Result<metadata::GetTestDescriptionResponse, Status> {
        let description = self
            .test_descriptions
            .lock()
            .iter()
            .find(|d| d.id == request.test_description_id)
            .cloned()
            .ok_or_else(|| Status::not_found(request.test_description_id))?;
        Ok(metadata::GetTestDescriptionResponse {
            test_description: Some(description),
        })
    }

    async fn create_alias(
        &self,
        request: metadata::CreateAliasRequest,
    ) -> std::result::Result<metadata::CreateAliasResponse, Status> {
        let target = request
            .alias_target
            .as_ref()
            .ok_or_else(|| Status::invalid_argument("missing alias target"))?;
        let (kind, target_id) = alias_target(target);
        let alias = metadata::Alias {
            name: request.alias_name.clone(),
            target_type: kind as i32,
            target_id,
        };
        self.aliases
            .lock()
            .insert(alias.name.clone(), alias.clone());
        self.alias_requests.lock().push(request);
        Ok(metadata::CreateAliasResponse { alias: Some(alias) })
    }

    async fn get_alias(
        &self,
        request: metadata::GetAliasRequest,
    ) -> std::result::Result<metadata::GetAliasResponse, Status> {
        let alias = self
            .aliases
            .lock()
            .get(&request.alias_name)
            .cloned()
            .ok_or_else(|| Status::not_found(request.alias_name))?;
        Ok(metadata::GetAliasResponse { alias: Some(alias) })
    }

    async fn delete_alias(
        &self,
        request: metadata::DeleteAliasRequest,
    ) -> std::result::Result<metadata::DeleteAliasResponse, Status> {
        let unregistered = self.aliases.lock().remove(&request.alias_name).is_some();
        Ok(metadata::DeleteAliasResponse { unregistered })
    }

    async fn query_aliases(
        &self,
        request: metadata::QueryAliasesRequest,
    ) -> std::result::Result<metadata::QueryAliasesResponse, Status> {
        self.queries.lock().push(request.odata_query);
        let mut aliases: Vec<_> = self.aliases.lock().values().cloned().collect();
        aliases.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(metadata::QueryAliasesResponse { aliases })
    }

    async fn create_from_json_document(
        &self,
        request: metadata::CreateFromJsonDocumentRequest,
    ) -> std::result::Result<metadata::CreateFromJsonDocumentResponse, Status> {
        self.json_documents.lock().push(request.json_document);
        Ok(metadata::CreateFromJsonDocumentResponse {
            uuts: vec![metadata::Uut {
                id: "uut-json".into(),
                model_name: "NI-4071".into(),
                ..Default::default()
            }],
            aliases: vec![metadata::Alias {
                name: "bench-dmm".into(),
                target_type: metadata::AliasTargetType::Uut as i32,
                target_id: "uut-json".into(),
            }],
            ..Default::default()
        })
    }

    async fn register_schema(
        &self,
        request: metadata::RegisterSchemaRequest,
    ) -> std::result::Result<metadata::RegisterSchemaResponse, Status> {
        let mut schemas = self.schemas.lock();
        schemas.push(request.schema);
        Ok(metadata::RegisterSchemaResponse {
            schema_id: format!("schema-{}", schemas.len()),
        })
    }

    async fn list_schemas(
        &self,
        _request: metadata::ListSchemasRequest,
    ) -> std::result::Result<metadata::ListSchemasResponse, Status> {
        let schemas = self
            .schemas
            .lock()
            .iter()
            .enumerate()
            .map(|(i, schema)| metadata::ExtensionSchema {
                id: format!("schema-{}", i + 1),
                schema: schema.clone(),
            })
            .collect();
        Ok(metadata::ListSchemasResponse { schemas })
    }
}

/// Connector handing out the mocks and counting how often each is built.
#[derive(Default)]
pub struct MockConnector {
    pub store: Arc<MockStore>,
    pub metadata: Arc<MockMetadata>,
    pub data_store_calls: AtomicUsize,
    pub moniker_locations: Mutex<Vec<String>>,
}

impl MockConnector {
    pub fn moniker_calls(&self) -> usize {
        self.moniker_locations.lock().len()
    }

    pub fn data_store_calls(&self) -> usize {
        self.data_store_calls.load(Ordering::SeqCst)
    }
}

impl ServiceConnector for MockConnector {
    fn data_store(&self) -> Result<Arc<dyn DataStoreService>> {
        self.data_store_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.store.clone())
    }

    fn metadata_store(&self) -> Result<Arc<dyn MetadataStoreService>> {
        Ok(self.metadata.clone())
    }

    fn moniker_service(&self, location: &str) -> Result<Arc<dyn MonikerService>> {
        self.moniker_locations.lock().push(location.to_string());
        Ok(self.store.clone())
    }
}
