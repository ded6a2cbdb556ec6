//! Data store record conversions.

use super::ToDomain;
use crate::{data, metadata, monikers};
use datastore_core::records::{
    ErrorInformation, Extensions, Moniker, Outcome, PublishedCondition, PublishedMeasurement,
    Step, TestResult,
};
use std::collections::HashMap;

// Moniker

impl From<&Moniker> for monikers::Moniker {
    fn from(moniker: &Moniker) -> Self {
        monikers::Moniker {
            service_location: moniker.service_location.clone(),
            data_source: moniker.data_source.clone(),
            data_instance: moniker.data_instance,
        }
    }
}

impl ToDomain<Moniker> for monikers::Moniker {
    fn to_domain(self) -> Moniker {
        Moniker {
            service_location: self.service_location,
            data_source: self.data_source,
            data_instance: self.data_instance,
        }
    }
}

// Outcome

impl From<Outcome> for data::Outcome {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Unspecified => data::Outcome::Unspecified,
            Outcome::Passed => data::Outcome::Passed,
            Outcome::Failed => data::Outcome::Failed,
            Outcome::Indeterminate => data::Outcome::Indeterminate,
        }
    }
}

impl ToDomain<Outcome> for data::Outcome {
    fn to_domain(self) -> Outcome {
        match self {
            data::Outcome::Unspecified => Outcome::Unspecified,
            data::Outcome::Passed => Outcome::Passed,
            data::Outcome::Failed => Outcome::Failed,
            data::Outcome::Indeterminate => Outcome::Indeterminate,
        }
    }
}

/// Outcome from its raw wire value; unknown values read as unspecified.
#[must_use]
pub fn outcome_from_wire(value: i32) -> Outcome {
    data::Outcome::try_from(value)
        .unwrap_or(data::Outcome::Unspecified)
        .to_domain()
}

/// Raw wire value of an outcome.
#[must_use]
pub fn outcome_to_wire(outcome: Outcome) -> i32 {
    data::Outcome::from(outcome) as i32
}

// ErrorInformation

impl From<&ErrorInformation> for data::ErrorInformation {
    fn from(info: &ErrorInformation) -> Self {
        data::ErrorInformation {
            error_code: info.error_code,
            message: info.message.clone(),
            source: info.source.clone(),
        }
    }
}

impl ToDomain<ErrorInformation> for data::ErrorInformation {
    fn to_domain(self) -> ErrorInformation {
        ErrorInformation {
            error_code: self.error_code,
            message: self.message,
            source: self.source,
        }
    }
}

// Extensions

/// Wire extension map from string extensions.
pub fn extensions_to_proto(extensions: &Extensions) -> HashMap<String, metadata::ExtensionValue> {
    extensions
        .iter()
        .map(|(key, value)| {
            (
                key.clone(),
                metadata::ExtensionValue {
                    metadata: Some(metadata::extension_value::Metadata::StringValue(
                        value.clone(),
                    )),
                },
            )
        })
        .collect()
}

/// String extensions from the wire map; empty values read as "".
pub fn extensions_from_proto(extensions: HashMap<String, metadata::ExtensionValue>) -> Extensions {
    extensions
        .into_iter()
        .map(|(key, value)| {
            let text = match value.metadata {
                Some(metadata::extension_value::Metadata::StringValue(s)) => s,
                None => String::new(),
            };
            (key, text)
        })
        .collect()
}

// PublishedCondition

impl From<&PublishedCondition> for data::PublishedCondition {
    fn from(condition: &PublishedCondition) -> Self {
        data::PublishedCondition {
            moniker: condition.moniker.as_ref().map(Into::into),
            id: condition.id.clone(),
            condition_name: condition.condition_name.clone(),
            condition_type: condition.condition_type.clone(),
            step_id: condition.step_id.clone(),
            test_result_id: condition.test_result_id.clone(),
        }
    }
}

impl ToDomain<PublishedCondition> for data::PublishedCondition {
    fn to_domain(self) -> PublishedCondition {
        PublishedCondition {
            moniker: self.moniker.map(ToDomain::to_domain),
            id: self.id,
            condition_name: self.condition_name,
            condition_type: self.condition_type,
            step_id: self.step_id,
            test_result_id: self.test_result_id,
        }
    }
}

// PublishedMeasurement

impl From<&PublishedMeasurement> for data::PublishedMeasurement {
    fn from(measurement: &PublishedMeasurement) -> Self {
        data::PublishedMeasurement {
            moniker: measurement.moniker.as_ref().map(Into::into),
            published_conditions: measurement
                .published_conditions
                .iter()
                .map(Into::into)
                .collect(),
            id: measurement.id.clone(),
            test_result_id: measurement.test_result_id.clone(),
            step_id: measurement.step_id.clone(),
            software_item_ids: measurement.software_item_ids.clone(),
            hardware_item_ids: measurement.hardware_item_ids.clone(),
            test_adapter_ids: measurement.test_adapter_ids.clone(),
            name: measurement.name.clone(),
            data_type: measurement.data_type.clone(),
            notes: measurement.notes.clone(),
            start_date_time: measurement.start_date_time.map(Into::into),
            end_date_time: measurement.end_date_time.map(Into::into),
            outcome: outcome_to_wire(measurement.outcome),
            parametric_index: measurement.parametric_index,
            error_information: measurement.error_information.as_ref().map(Into::into),
        }
    }
}

impl ToDomain<PublishedMeasurement> for data::PublishedMeasurement {
    fn to_domain(self) -> PublishedMeasurement {
        PublishedMeasurement {
            moniker: self.moniker.map(ToDomain::to_domain),
            published_conditions: self
                .published_conditions
                .into_iter()
                .map(ToDomain::to_domain)
                .collect(),
            id: self.id,
            test_result_id: self.test_result_id,
            step_id: self.step_id,
            software_item_ids: self.software_item_ids,
            hardware_item_ids: self.hardware_item_ids,
            test_adapter_ids: self.test_adapter_ids,
            name: self.name,
            data_type: self.data_type,
            notes: self.notes,
            start_date_time: self.start_date_time.map(ToDomain::to_domain),
            end_date_time: self.end_date_time.map(ToDomain::to_domain),
            outcome: outcome_from_wire(self.outcome),
            parametric_index: self.parametric_index,
            error_information: self.error_information.map(ToDomain::to_domain),
        }
    }
}

// Step

impl From<&Step> for data::Step {
    fn from(step: &Step) -> Self {
        data::Step {
            id: step.id.clone(),
            parent_step_id: step.parent_step_id.clone(),
            test_result_id: step.test_result_id.clone(),
            test_id: step.test_id.clone(),
            name: step.name.clone(),
            r#type: step.step_type.clone(),
            notes: step.notes.clone(),
            start_date_time: step.start_date_time.map(Into::into),
            end_date_time: step.end_date_time.map(Into::into),
            link: step.link.clone(),
            extensions: extensions_to_proto(&step.extensions),
            schema_id: step.schema_id.clone(),
            error_information: step.error_information.as_ref().map(Into::into),
            outcome: outcome_to_wire(step.outcome),
        }
    }
}

impl ToDomain<Step> for data::Step {
    fn to_domain(self) -> Step {
        Step {
            id: self.id,
            parent_step_id: self.parent_step_id,
            test_result_id: self.test_result_id,
            test_id: self.test_id,
            name: self.name,
            step_type: self.r#type,
            notes: self.notes,
            start_date_time: self.start_date_time.map(ToDomain::to_domain),
            end_date_time: self.end_date_time.map(ToDomain::to_domain),
            link: self.link,
            extensions: extensions_from_proto(self.extensions),
            schema_id: self.schema_id,
            error_information: self.error_information.map(ToDomain::to_domain),
            outcome: outcome_from_wire(self.outcome),
        }
    }
}

// TestResult

impl From<&TestResult> for data::TestResult {
    fn from(result: &TestResult) -> Self {
        data::TestResult {
            id: result.id.clone(),
            uut_instance_id: result.uut_instance_id.clone(),
            operator_id: result.operator_id.clone(),
            test_station_id: result.test_station_id.clone(),
            test_description_id: result.test_description_id.clone(),
            software_item_ids: result.software_item_ids.clone(),
            hardware_item_ids: result.hardware_item_ids.clone(),
            test_adapter_ids: result.test_adapter_ids.clone(),
            name: result.name.clone(),
            start_date_time: result.start_date_time.map(Into::into),
            end_date_time: result.end_date_time.map(Into::into),
            outcome: outcome_to_wire(result.outcome),
            link: result.link.clone(),
            extensions: extensions_to_proto(&result.extensions),
            schema_id: result.schema_id.clone(),
            error_information: result.error_information.as_ref().map(Into::into),
        }
    }
}

impl ToDomain<TestResult> for data::TestResult {
    fn to_domain(self) -> TestResult {
        TestResult {
            id: self.id,
            uut_instance_id: self.uut_instance_id,
            operator_id: self.operator_id,
            test_station_id: self.test_station_id,
            test_description_id: self.test_description_id,
            software_item_ids: self.software_item_ids,
            hardware_item_ids: self.hardware_item_ids,
            test_adapter_ids: self.test_adapter_ids,
            name: self.name,
            start_date_time: self.start_date_time.map(ToDomain::to_domain),
            end_date_time: self.end_date_time.map(ToDomain::to_domain),
            outcome: outcome_from_wire(self.outcome),
            link: self.link,
            extensions: extensions_from_proto(self.extensions),
            schema_id: self.schema_id,
            error_information: self.error_information.map(ToDomain::to_domain),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datastore_core::BinaryTime;

    #[test]
    fn unknown_outcome_reads_unspecified() {
        assert_eq!(outcome_from_wire(99), Outcome::Unspecified);
        assert_eq!(outcome_from_wire(outcome_to_wire(Outcome::Failed)), Outcome::Failed);
    }

    #[test]
    fn measurement_record_keeps_moniker_and_conditions() {
        let measurement = PublishedMeasurement {
            moniker: Some(Moniker::new("localhost:50051", "m-1", 3)),
            published_conditions: vec![PublishedCondition {
                condition_name: "Temperature".into(),
                moniker: Some(Moniker::new("localhost:50051", "c-1", 0)),
                ..Default::default()
            }],
            name: "Voltage".into(),
            start_date_time: Some(BinaryTime::new(3_900_000_000, 17)),
            outcome: Outcome::Passed,
            parametric_index: 2,
            error_information: Some(ErrorInformation {
                error_code: -1,
                message: "overrange".into(),
                source: "dmm".into(),
            }),
            ..Default::default()
        };
        let proto = data::PublishedMeasurement::from(&measurement);
        assert_eq!(proto.outcome, data::Outcome::Passed as i32);
        let back: PublishedMeasurement = proto.to_domain();
        assert_eq!(back, measurement);
    }

    #[test]
    fn step_type_maps_to_raw_identifier_field() {
        let mut step = Step {
            name: "Setup".into(),
            step_type: "Action".into(),
            ..Default::default()
        };
        step.extensions.insert("fixture".into(), "F-12".into());
        let proto = data::Step::from(&step);
        assert_eq!(proto.r#type, "Action");
        let back: Step = proto.to_domain();
        assert_eq!(back, step);
    }

    #[test]
    fn empty_extension_value_reads_as_empty_string() {
        let mut wire = HashMap::new();
        wire.insert("k".to_string(), metadata::ExtensionValue { metadata: None });
        assert_eq!(extensions_from_proto(wire).get("k").map(String::as_str), Some(""));
    }
}
