//! Records returned by the data store service.

use crate::time::BinaryTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Location of one stored datum, resolvable through a moniker service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Moniker {
    /// Address of the service holding the data (`host:port` or a URL).
    pub service_location: String,
    /// Opaque source identifier understood by that service.
    pub data_source: String,
    /// Instance number within the source.
    pub data_instance: i64,
}

impl Moniker {
    /// Moniker for one instance of a data source.
    pub fn new(
        service_location: impl Into<String>,
        data_source: impl Into<String>,
        data_instance: i64,
    ) -> Self {
        Self {
            service_location: service_location.into(),
            data_source: data_source.into(),
            data_instance,
        }
    }
}

impl fmt::Display for Moniker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "service_location: {:?} data_source: {:?} data_instance: {}",
            self.service_location, self.data_source, self.data_instance
        )
    }
}

/// Result of a step, test result or measurement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// Not reported.
    #[default]
    Unspecified,
    /// Passed.
    Passed,
    /// Failed.
    Failed,
    /// Could not be determined.
    Indeterminate,
}

/// Error reported alongside a measurement, step or test result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInformation {
    /// Numeric error code, 0 for none.
    pub error_code: i32,
    /// Human-readable description.
    pub message: String,
    /// Where the error originated.
    pub source: String,
}

/// String-valued extensions validated against a registered schema.
pub type Extensions = BTreeMap<String, String>;

/// A condition as stored by the service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PublishedCondition {
    /// Where the condition value can be read back.
    pub moniker: Option<Moniker>,
    /// Service-assigned identifier.
    pub id: String,
    /// Name given at publish time.
    pub condition_name: String,
    /// Category given at publish time.
    pub condition_type: String,
    /// Owning step.
    pub step_id: String,
    /// Owning test result.
    pub test_result_id: String,
}

/// A measurement as stored by the service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PublishedMeasurement {
    /// Where the measurement value can be read back.
    pub moniker: Option<Moniker>,
    /// Conditions in effect when the measurement was taken.
    pub published_conditions: Vec<PublishedCondition>,
    /// Service-assigned identifier.
    pub id: String,
    /// Owning test result.
    pub test_result_id: String,
    /// Owning step.
    pub step_id: String,
    /// Software items involved.
    pub software_item_ids: Vec<String>,
    /// Hardware items involved.
    pub hardware_item_ids: Vec<String>,
    /// Test adapters involved.
    pub test_adapter_ids: Vec<String>,
    /// Name given at publish time.
    pub name: String,
    /// Wire type identifier of the stored value.
    pub data_type: String,
    /// Free-form notes.
    pub notes: String,
    /// Start of the measurement.
    pub start_date_time: Option<BinaryTime>,
    /// End of the measurement.
    pub end_date_time: Option<BinaryTime>,
    /// Reported outcome.
    pub outcome: Outcome,
    /// Position within a batch publish.
    pub parametric_index: i32,
    /// Reported error, if any.
    pub error_information: Option<ErrorInformation>,
}

/// One step of a test.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// Service-assigned identifier, empty before creation.
    pub id: String,
    /// Enclosing step, empty at the top level.
    pub parent_step_id: String,
    /// Owning test result.
    pub test_result_id: String,
    /// Test description this step executes.
    pub test_id: String,
    /// Display name.
    pub name: String,
    /// Step category.
    pub step_type: String,
    /// Free-form notes.
    pub notes: String,
    /// When the step started.
    pub start_date_time: Option<BinaryTime>,
    /// When the step ended.
    pub end_date_time: Option<BinaryTime>,
    /// External link.
    pub link: String,
    /// Schema-validated extensions.
    pub extensions: Extensions,
    /// Schema used to validate `extensions`.
    pub schema_id: String,
    /// Reported error, if any.
    pub error_information: Option<ErrorInformation>,
    /// Reported outcome.
    pub outcome: Outcome,
}

/// The result of running a test against one UUT instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    /// Service-assigned identifier, empty before creation.
    pub id: String,
    /// Unit under test.
    pub uut_instance_id: String,
    /// Operator who ran the test.
    pub operator_id: String,
    /// Station the test ran on.
    pub test_station_id: String,
    /// Test description.
    pub test_description_id: String,
    /// Software items involved.
    pub software_item_ids: Vec<String>,
    /// Hardware items involved.
    pub hardware_item_ids: Vec<String>,
    /// Test adapters involved.
    pub test_adapter_ids: Vec<String>,
    /// Display name.
    pub name: String,
    /// When the test started.
    pub start_date_time: Option<BinaryTime>,
    /// When the test ended.
    pub end_date_time: Option<BinaryTime>,
    /// Reported outcome.
    pub outcome: Outcome,
    /// External link.
    pub link: String,
    /// Schema-validated extensions.
    pub extensions: Extensions,
    /// Schema used to validate `extensions`.
    pub schema_id: String,
    /// Reported error, if any.
    pub error_information: Option<ErrorInformation>,
}
