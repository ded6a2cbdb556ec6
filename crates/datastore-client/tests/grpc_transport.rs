//! Reads over a real tonic transport against an in-process moniker server.

use std::net::SocketAddr;
use std::sync::Arc;

use datastore_client::{ClientConfig, DataStoreClient};
use datastore_core::records::Moniker;
use datastore_core::{Scalar, Value};
use datastore_proto::monikers::moniker_service_server::{self, MonikerServiceServer};
use datastore_proto::monikers::{self, ReadFromMonikerResult};
use datastore_proto::{pack, type_names, types};
use parking_lot::Mutex;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::{Request, Response, Status};

#[derive(Default)]
struct ScalarServer {
    seen_auth: Mutex<Vec<Option<String>>>,
    seen_monikers: Mutex<Vec<monikers::Moniker>>,
}

#[tonic::async_trait]
impl moniker_service_server::MonikerService for ScalarServer {
    async fn read_from_moniker(
        &self,
        request: Request<monikers::Moniker>,
    ) -> Result<Response<ReadFromMonikerResult>, Status> {
        let auth = request
            .metadata()
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.seen_auth.lock().push(auth);
        self.seen_monikers.lock().push(request.into_inner());

        let scalar = types::Scalar {
            value: Some(types::scalar::Value::DoubleValue(2.5)),
            attributes: [(
                "NI_UnitDescription".to_string(),
                types::AttributeValue {
                    attribute: Some(types::attribute_value::Attribute::StringValue("Ohm".into())),
                },
            )]
            .into_iter()
            .collect(),
        };
        Ok(Response::new(ReadFromMonikerResult {
            value: Some(pack(&scalar, type_names::SCALAR)),
        }))
    }
}

async fn start_server() -> (SocketAddr, Arc<ScalarServer>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = Arc::new(ScalarServer::default());
    let service = MonikerServiceServer::from_arc(Arc::clone(&server));
    tokio::spawn(async move {
        tonic::transport::Server::builder()
            .add_service(service)
            .serve_with_incoming(TcpListenerStream::new(listener))
            .await
            .unwrap();
    });
    (addr, server)
}

#[tokio::test]
async fn test_read_over_grpc_sends_bearer_token() {
    let (addr, server) = start_server().await;
    let config = ClientConfig {
        jwt_token: Some("test-token".into()),
        ..ClientConfig::default()
    };
    let client = DataStoreClient::from_config(&config).unwrap();

    let moniker = Moniker::new(format!("http://{addr}"), "measurements", 9);
    let value = client.read_data(&moniker).await.unwrap();
    assert_eq!(value, Value::Scalar(Scalar::new(2.5, "Ohm")));

    assert_eq!(
        *server.seen_auth.lock(),
        vec![Some("Bearer test-token".to_string())]
    );
    let seen = server.seen_monikers.lock();
    assert_eq!(seen[0].data_source, "measurements");
    assert_eq!(seen[0].data_instance, 9);
}

#[tokio::test]
async fn test_disabled_auth_sends_no_header() {
    let (addr, server) = start_server().await;
    let config = ClientConfig {
        disable_auth: true,
        ..ClientConfig::default()
    };
    let client = DataStoreClient::from_config(&config).unwrap();

    let moniker = Moniker::new(addr.to_string(), "measurements", 0);
    let scalar: Scalar = client.read_data_as(&moniker).await.unwrap();
    assert_eq!(scalar.units, "Ohm");
    assert_eq!(*server.seen_auth.lock(), vec![None]);
}

#[tokio::test]
async fn test_unreachable_service_is_a_status_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = ClientConfig {
        disable_auth: true,
        connect_timeout_ms: 500,
        request_timeout_ms: 1_000,
        ..ClientConfig::default()
    };
    let client = DataStoreClient::from_config(&config).unwrap();
    let err = client
        .read_data(&Moniker::new(addr.to_string(), "m", 0))
        .await
        .unwrap_err();
    assert!(matches!(err, datastore_client::ClientError::RpcStatus(_)));
}
