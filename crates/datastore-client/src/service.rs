//! Service seams between the clients and the transport.
//!
//! Each remote service is an async trait whose methods mirror the RPCs one
//! to one. The `Grpc*` types implement them over a tonic channel; tests
//! substitute in-process mocks. Every trait method defaults to
//! `UNIMPLEMENTED` so a mock only spells out the calls it expects.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use datastore_proto::data::data_store_service_client::DataStoreServiceClient;
use datastore_proto::metadata::metadata_store_service_client::MetadataStoreServiceClient;
use datastore_proto::monikers::moniker_service_client::MonikerServiceClient;
use datastore_proto::{data, metadata, monikers};
use tonic::service::interceptor::InterceptedService;
use tonic::transport::Channel;
use tonic::Status;

use crate::auth::{AuthInterceptor, JwtTokenProvider, StaticTokenProvider};
use crate::config::ClientConfig;
use crate::connection::{lazy_channel, ChannelConfig, ChannelTarget};
use crate::error::Result;

/// Channel with the bearer-token interceptor applied.
pub type AuthChannel = InterceptedService<Channel, AuthInterceptor>;

macro_rules! grpc_service {
    (
        $(#[$trait_meta:meta])*
        trait $trait:ident => $grpc:ident($client:ident) {
            $( fn $method:ident($req:ty) -> $resp:ty; )*
        }
    ) => {
        $(#[$trait_meta])*
        #[async_trait]
        pub trait $trait: Send + Sync {
            $(
                #[doc = concat!("`", stringify!($method), "` RPC.")]
                async fn $method(&self, _request: $req) -> std::result::Result<$resp, Status> {
                    Err(Status::unimplemented(stringify!($method)))
                }
            )*
        }

        #[doc = concat!("[`", stringify!($trait), "`] over a gRPC channel.")]
        #[derive(Debug, Clone)]
        pub struct $grpc {
            client: $client<AuthChannel>,
        }

        impl $grpc {
            /// Wrap an authenticated channel; message size limits are lifted.
            pub fn new(channel: AuthChannel) -> Self {
                Self {
                    client: $client::new(channel)
                        .max_decoding_message_size(usize::MAX)
                        .max_encoding_message_size(usize::MAX),
                }
            }
        }

        #[async_trait]
        impl $trait for $grpc {
            $(
                async fn $method(&self, request: $req) -> std::result::Result<$resp, Status> {
                    tracing::debug!(rpc = stringify!($method), "Sending request");
                    let mut client = self.client.clone();
                    let response = client.$method(request).await.map_err(|status| {
                        tracing::warn!(
                            rpc = stringify!($method),
                            code = ?status.code(),
                            error = status.message(),
                            "Request failed"
                        );
                        status
                    })?;
                    Ok(response.into_inner())
                }
            )*
        }
    };
}

grpc_service! {
    /// `ni.measurements.data.v1.DataStoreService`.
    trait DataStoreService => GrpcDataStore(DataStoreServiceClient) {
        fn publish_condition(data::PublishConditionRequest) -> data::PublishConditionResponse;
        fn publish_condition_batch(data::PublishConditionBatchRequest) -> data::PublishConditionBatchResponse;
        fn publish_measurement(data::PublishMeasurementRequest) -> data::PublishMeasurementResponse;
        fn publish_measurement_batch(data::PublishMeasurementBatchRequest) -> data::PublishMeasurementBatchResponse;
        fn create_step(data::CreateStepRequest) -> data::CreateStepResponse;
        fn get_step(data::GetStepRequest) -> data::GetStepResponse;
        fn create_test_result(data::CreateTestResultRequest) -> data::CreateTestResultResponse;
        fn get_test_result(data::GetTestResultRequest) -> data::GetTestResultResponse;
        fn query_conditions(data::QueryConditionsRequest) -> data::QueryConditionsResponse;
        fn query_measurements(data::QueryMeasurementsRequest) -> data::QueryMeasurementsResponse;
        fn query_steps(data::QueryStepsRequest) -> data::QueryStepsResponse;
        fn query_test_results(data::QueryTestResultsRequest) -> data::QueryTestResultsResponse;
    }
}

grpc_service! {
    /// `ni.datamonikers.v1.MonikerService`.
    trait MonikerService => GrpcMonikerService(MonikerServiceClient) {
        fn read_from_moniker(monikers::Moniker) -> monikers::ReadFromMonikerResult;
    }
}

grpc_service! {
    /// `ni.measurements.metadata.v1.MetadataStoreService`.
    trait MetadataStoreService => GrpcMetadataStore(MetadataStoreServiceClient) {
        fn create_uut(metadata::CreateUutRequest) -> metadata::CreateUutResponse;
        fn get_uut(metadata::GetUutRequest) -> metadata::GetUutResponse;
        fn query_uuts(metadata::QueryUutsRequest) -> metadata::QueryUutsResponse;
        fn create_uut_instance(metadata::CreateUutInstanceRequest) -> metadata::CreateUutInstanceResponse;
        fn get_uut_instance(metadata::GetUutInstanceRequest) -> metadata::GetUutInstanceResponse;
        fn query_uut_instances(metadata::QueryUutInstancesRequest) -> metadata::QueryUutInstancesResponse;
        fn create_operator(metadata::CreateOperatorRequest) -> metadata::CreateOperatorResponse;
        fn get_operator(metadata::GetOperatorRequest) -> metadata::GetOperatorResponse;
        fn query_operators(metadata::QueryOperatorsRequest) -> metadata::QueryOperatorsResponse;
        fn create_test_station(metadata::CreateTestStationRequest) -> metadata::CreateTestStationResponse;
        fn get_test_station(metadata::GetTestStationRequest) -> metadata::GetTestStationResponse;
        fn query_test_stations(metadata::QueryTestStationsRequest) -> metadata::QueryTestStationsResponse;
        fn create_hardware_item(metadata::CreateHardwareItemRequest) -> metadata::CreateHardwareItemResponse;
        fn get_hardware_item(metadata::GetHardwareItemRequest) -> metadata::GetHardwareItemResponse;
        fn query_hardware_items(metadata::QueryHardwareItemsRequest) -> metadata::QueryHardwareItemsResponse;
        fn create_software_item(metadata::CreateSoftwareItemRequest) -> metadata::CreateSoftwareItemResponse;
        fn get_software_item(metadata::GetSoftwareItemRequest) -> metadata::GetSoftwareItemResponse;
        fn query_software_items(metadata::QuerySoftwareItemsRequest) -> metadata::QuerySoftwareItemsResponse;
        fn create_test_adapter(metadata::CreateTestAdapterRequest) -> metadata::CreateTestAdapterResponse;
        fn get_test_adapter(metadata::GetTestAdapterRequest) -> metadata::GetTestAdapterResponse;
        fn query_test_adapters(metadata::QueryTestAdaptersRequest) -> metadata::QueryTestAdaptersResponse;
        fn create_test(metadata::CreateTestRequest) -> metadata::CreateTestResponse;
        fn get_test(metadata::GetTestRequest) -> metadata::GetTestResponse;
        fn query_tests(metadata::QueryTestsRequest) -> metadata::QueryTestsResponse;
        fn create_test_description(metadata::CreateTestDescriptionRequest) -> metadata::CreateTestDescriptionResponse;
        fn get_test_description(metadata::GetTestDescriptionRequest) -> metadata::GetTestDescriptionResponse;
        fn query_test_descriptions(metadata::QueryTestDescriptionsRequest) -> metadata::QueryTestDescriptionsResponse;
        fn create_alias(metadata::CreateAliasRequest) -> metadata::CreateAliasResponse;
        fn get_alias(metadata::GetAliasRequest) -> metadata::GetAliasResponse;
        fn delete_alias(metadata::DeleteAliasRequest) -> metadata::DeleteAliasResponse;
        fn query_aliases(metadata::QueryAliasesRequest) -> metadata::QueryAliasesResponse;
        fn create_from_json_document(metadata::CreateFromJsonDocumentRequest) -> metadata::CreateFromJsonDocumentResponse;
        fn register_schema(metadata::RegisterSchemaRequest) -> metadata::RegisterSchemaResponse;
        fn list_schemas(metadata::ListSchemasRequest) -> metadata::ListSchemasResponse;
    }
}

/// Factory for service handles.
///
/// Called lazily by the clients: at most once for the data and metadata
/// stores, and once per distinct moniker service location.
pub trait ServiceConnector: Send + Sync {
    /// Handle to the data store service.
    fn data_store(&self) -> Result<Arc<dyn DataStoreService>>;

    /// Handle to the metadata store service.
    fn metadata_store(&self) -> Result<Arc<dyn MetadataStoreService>>;

    /// Handle to the moniker service at `location` (`host:port`).
    fn moniker_service(&self, location: &str) -> Result<Arc<dyn MonikerService>>;
}

/// Connector producing lazily dialed gRPC channels.
#[derive(Clone)]
pub struct GrpcConnector {
    address: String,
    insecure: bool,
    channel_config: ChannelConfig,
    interceptor: AuthInterceptor,
}

impl fmt::Debug for GrpcConnector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GrpcConnector")
            .field("address", &self.address)
            .field("insecure", &self.insecure)
            .finish_non_exhaustive()
    }
}

impl GrpcConnector {
    /// Connector for the services at `address`.
    pub fn new(
        address: impl Into<String>,
        insecure: bool,
        channel_config: ChannelConfig,
        interceptor: AuthInterceptor,
    ) -> Self {
        Self {
            address: address.into(),
            insecure,
            channel_config,
            interceptor,
        }
    }

    /// Connector built from validated configuration.
    ///
    /// `disable_auth` skips the interceptor; a configured `jwt_token` is sent
    /// as is; otherwise tokens come from [`JwtTokenProvider`].
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        let interceptor = if config.disable_auth {
            AuthInterceptor::disabled()
        } else if let Some(token) = config.jwt_token.as_deref().filter(|t| !t.is_empty()) {
            AuthInterceptor::new(Arc::new(StaticTokenProvider::new(token)))
        } else {
            AuthInterceptor::new(Arc::new(JwtTokenProvider::new()))
        };
        Ok(Self::new(
            config.address(),
            config.use_insecure_channel,
            config.channel_config(),
            interceptor,
        ))
    }

    fn channel(&self, address: &str) -> Result<AuthChannel> {
        let target = ChannelTarget::resolve(address, self.insecure)?;
        let channel = lazy_channel(&target, &self.channel_config)?;
        Ok(InterceptedService::new(channel, self.interceptor.clone()))
    }
}

impl ServiceConnector for GrpcConnector {
    fn data_store(&self) -> Result<Arc<dyn DataStoreService>> {
        Ok(Arc::new(GrpcDataStore::new(self.channel(&self.address)?)))
    }

    fn metadata_store(&self) -> Result<Arc<dyn MetadataStoreService>> {
        Ok(Arc::new(GrpcMetadataStore::new(self.channel(&self.address)?)))
    }

    fn moniker_service(&self, location: &str) -> Result<Arc<dyn MonikerService>> {
        Ok(Arc::new(GrpcMonikerService::new(self.channel(location)?)))
    }
}
