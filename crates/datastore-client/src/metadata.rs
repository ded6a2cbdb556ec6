//! Metadata store client: UUTs, operators, stations, items, tests, aliases
//! and schemas.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use datastore_core::metadata::{
    Alias, AliasTarget, ExtensionSchema, HardwareItem, MetadataItems, Operator, SoftwareItem, Test,
    TestAdapter, TestDescription, TestStation, Uut, UutInstance,
};
use datastore_proto::convert::ToDomain;
use datastore_proto::metadata as proto;
use parking_lot::Mutex;

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::service::{GrpcConnector, MetadataStoreService, ServiceConnector};
use crate::state::ClientState;

const UTF8_BOM: char = '\u{feff}';

/// Read a UTF-8 text file, dropping a leading byte-order mark.
async fn read_text_file(path: &Path) -> std::io::Result<String> {
    let text = tokio::fs::read_to_string(path).await?;
    Ok(match text.strip_prefix(UTF8_BOM) {
        Some(stripped) => stripped.to_string(),
        None => text,
    })
}

struct Inner {
    state: ClientState,
    service: Option<Arc<dyn MetadataStoreService>>,
}

/// Client for the metadata store.
///
/// Shares the lifecycle rules of [`DataStoreClient`](crate::DataStoreClient):
/// lazy connection, one-way close.
pub struct MetadataStoreClient {
    connector: Arc<dyn ServiceConnector>,
    inner: Mutex<Inner>,
}

impl fmt::Debug for MetadataStoreClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetadataStoreClient")
            .field("state", &self.inner.lock().state)
            .finish_non_exhaustive()
    }
}

// create_*/get_*/query_* for one entity kind.
macro_rules! entity_methods {
    (
        $entity:ident, $label:literal, $field:ident, $id_field:ident, $plural:ident,
        $create:ident($create_req:ident), $get:ident($get_req:ident), $query:ident($query_req:ident)
    ) => {
        #[doc = concat!("Create a ", $label, ", returning its id.")]
        pub async fn $create(&self, $field: &$entity) -> Result<String> {
            self.ensure_open()?;
            let request = proto::$create_req {
                $field: Some($field.into()),
            };
            Ok(self.service()?.$create(request).await?.$id_field)
        }

        #[doc = concat!("Fetch a ", $label, " by id.")]
        pub async fn $get(&self, id: &str) -> Result<$entity> {
            self.ensure_open()?;
            let request = proto::$get_req {
                $id_field: id.to_string(),
            };
            let response = self.service()?.$get(request).await?;
            Ok(response.$field.map(ToDomain::to_domain).unwrap_or_default())
        }

        #[doc = concat!("Every ", $label, " matching an OData query.")]
        pub async fn $query(&self, odata_query: &str) -> Result<Vec<$entity>> {
            self.ensure_open()?;
            let request = proto::$query_req {
                odata_query: odata_query.to_string(),
            };
            let response = self.service()?.$query(request).await?;
            Ok(response.$plural.into_iter().map(ToDomain::to_domain).collect())
        }
    };
}

impl MetadataStoreClient {
    /// Client using `connector` to reach the service.
    pub fn new(connector: Arc<dyn ServiceConnector>) -> Self {
        Self {
            connector,
            inner: Mutex::new(Inner {
                state: ClientState::Open,
                service: None,
            }),
        }
    }

    /// Client for the service described by `config`.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Ok(Self::new(Arc::new(GrpcConnector::from_config(config)?)))
    }

    /// Whether [`close`](Self::close) has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.lock().state == ClientState::Closed
    }

    /// Close the client and release its connection. Idempotent.
    pub fn close(&self) {
        let mut inner = self.inner.lock();
        if inner.state.close() {
            inner.service = None;
            tracing::debug!("Metadata store client closed");
        }
    }

    fn ensure_open(&self) -> Result<()> {
        self.inner.lock().state.ensure_open()
    }

    fn service(&self) -> Result<Arc<dyn MetadataStoreService>> {
        let mut inner = self.inner.lock();
        inner.state.ensure_open()?;
        if let Some(service) = &inner.service {
            return Ok(Arc::clone(service));
        }
        let service = self.connector.metadata_store()?;
        inner.service = Some(Arc::clone(&service));
        Ok(service)
    }

    entity_methods!(
        Uut, "UUT", uut, uut_id, uuts,
        create_uut(CreateUutRequest), get_uut(GetUutRequest), query_uuts(QueryUutsRequest)
    );

    entity_methods!(
        UutInstance, "UUT instance", uut_instance, uut_instance_id, uut_instances,
        create_uut_instance(CreateUutInstanceRequest),
        get_uut_instance(GetUutInstanceRequest),
        query_uut_instances(QueryUutInstancesRequest)
    );

    entity_methods!(
        Operator, "operator", operator, operator_id, operators,
        create_operator(CreateOperatorRequest),
        get_operator(GetOperatorRequest),
        query_operators(QueryOperatorsRequest)
    );

    entity_methods!(
        TestStation, "test station", test_station, test_station_id, test_stations,
        create_test_station(CreateTestStationRequest),
        get_test_station(GetTestStationRequest),
        query_test_stations(QueryTestStationsRequest)
    );

    entity_methods!(
        HardwareItem, "hardware item", hardware_item, hardware_item_id, hardware_items,
        create_hardware_item(CreateHardwareItemRequest),
        get_hardware_item(GetHardwareItemRequest),
        query_hardware_items(QueryHardwareItemsRequest)
    );

    entity_methods!(
        SoftwareItem, "software item", software_item, software_item_id, software_items,
        create_software_item(CreateSoftwareItemRequest),
        get_software_item(GetSoftwareItemRequest),
        query_software_items(QuerySoftwareItemsRequest)
    );

    entity_methods!(
        TestAdapter, "test adapter", test_adapter, test_adapter_id, test_adapters,
        create_test_adapter(CreateTestAdapterRequest),
        get_test_adapter(GetTestAdapterRequest),
        query_test_adapters(QueryTestAdaptersRequest)
    );

    entity_methods!(
        Test, "test", test, test_id, tests,
        create_test(CreateTestRequest), get_test(GetTestRequest), query_tests(QueryTestsRequest)
    );

    entity_methods!(
        TestDescription, "test description", test_description, test_description_id,
        test_descriptions,
        create_test_description(CreateTestDescriptionRequest),
        get_test_description(GetTestDescriptionRequest),
        query_test_descriptions(QueryTestDescriptionsRequest)
    );

    /// Register `alias_name` for an existing entity.
    ///
    /// Registering a name that is already taken moves it to the new target.
    pub async fn create_alias(
        &self,
        alias_name: &str,
        target: impl Into<AliasTarget>,
    ) -> Result<Alias> {
        self.ensure_open()?;
        let target = target.into();
        let request = proto::CreateAliasRequest {
            alias_name: alias_name.to_string(),
            alias_target: Some((&target).into()),
        };
        let response = self.service()?.create_alias(request).await?;
        Ok(response.alias.map(ToDomain::to_domain).unwrap_or_default())
    }

    /// Look up an alias and the entity it resolves to.
    pub async fn get_alias(&self, alias_name: &str) -> Result<Alias> {
        self.ensure_open()?;
        let request = proto::GetAliasRequest {
            alias_name: alias_name.to_string(),
        };
        let response = self.service()?.get_alias(request).await?;
        Ok(response.alias.map(ToDomain::to_domain).unwrap_or_default())
    }

    /// Unregister an alias. Returns `false` when it did not exist.
    pub async fn delete_alias(&self, alias_name: &str) -> Result<bool> {
        self.ensure_open()?;
        let request = proto::DeleteAliasRequest {
            alias_name: alias_name.to_string(),
        };
        Ok(self.service()?.delete_alias(request).await?.unregistered)
    }

    /// Every alias matching an OData query.
    pub async fn query_aliases(&self, odata_query: &str) -> Result<Vec<Alias>> {
        self.ensure_open()?;
        let request = proto::QueryAliasesRequest {
            odata_query: odata_query.to_string(),
        };
        let response = self.service()?.query_aliases(request).await?;
        Ok(response.aliases.into_iter().map(ToDomain::to_domain).collect())
    }

    /// Create every entity and alias described by a JSON metadata document.
    pub async fn create_from_json_document(&self, json_document: &str) -> Result<MetadataItems> {
        self.ensure_open()?;
        let request = proto::CreateFromJsonDocumentRequest {
            json_document: json_document.to_string(),
        };
        let response = self.service()?.create_from_json_document(request).await?;
        Ok(response.to_domain())
    }

    /// Create the metadata described by a UTF-8 JSON file.
    ///
    /// A leading byte-order mark is stripped; the rest is sent verbatim.
    pub async fn create_from_json_file(&self, path: impl AsRef<Path>) -> Result<MetadataItems> {
        self.ensure_open()?;
        let path = path.as_ref();
        let document = read_text_file(path)
            .await
            .map_err(|source| ClientError::MetadataFile {
                path: path.display().to_string(),
                source,
            })?;
        self.create_from_json_document(&document).await
    }

    /// Register an extension schema, returning its id.
    pub async fn register_schema(&self, schema: &str) -> Result<String> {
        self.ensure_open()?;
        let request = proto::RegisterSchemaRequest {
            schema: schema.to_string(),
        };
        Ok(self.service()?.register_schema(request).await?.schema_id)
    }

    /// Register the schema stored in a UTF-8 file.
    ///
    /// A leading byte-order mark is stripped; the rest is sent verbatim.
    pub async fn register_schema_from_file(&self, path: impl AsRef<Path>) -> Result<String> {
        self.ensure_open()?;
        let path = path.as_ref();
        let schema = read_text_file(path)
            .await
            .map_err(|source| ClientError::SchemaFile {
                path: path.display().to_string(),
                source,
            })?;
        self.register_schema(&schema).await
    }

    /// Every registered extension schema.
    pub async fn list_schemas(&self) -> Result<Vec<ExtensionSchema>> {
        self.ensure_open()?;
        let response = self
            .service()?
            .list_schemas(proto::ListSchemasRequest {})
            .await?;
        Ok(response.schemas.into_iter().map(ToDomain::to_domain).collect())
    }
}

impl Drop for MetadataStoreClient {
    fn drop(&mut self) {
        self.close();
    }
}
