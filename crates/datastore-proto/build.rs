//! Build script for datastore-proto
//!
//! Generates gRPC/protobuf bindings during `cargo build`.

const PROTOS: &[&str] = &[
    "proto/ni/protobuf/types/precision_timestamp.proto",
    "proto/ni/protobuf/types/attribute_value.proto",
    "proto/ni/protobuf/types/scalar.proto",
    "proto/ni/protobuf/types/array.proto",
    "proto/ni/protobuf/types/vector.proto",
    "proto/ni/protobuf/types/waveform.proto",
    "proto/ni/protobuf/types/xydata.proto",
    "proto/ni/datamonikers/v1/data_moniker.proto",
    "proto/ni/measurements/data/v1/data_store.proto",
    "proto/ni/measurements/data/v1/data_store_service.proto",
    "proto/ni/measurements/metadata/v1/metadata_store.proto",
];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let build_server = std::env::var_os("CARGO_FEATURE_SERVER").is_some();

    tonic_build::configure()
        .build_server(build_server)
        .build_client(true)
        .type_attribute(".", "#[allow(missing_docs)]")
        .compile(PROTOS, &["proto"])?;

    Ok(())
}
