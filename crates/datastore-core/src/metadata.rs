//! Entities managed by the metadata store service.
//!
//! Every entity can also be addressed through an [`Alias`], a stable name
//! registered against its id.

use crate::records::Extensions;
use serde::{Deserialize, Serialize};

/// A product model that can be tested.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Uut {
    /// Service-assigned identifier, empty before creation.
    pub id: String,
    /// Model name.
    pub model_name: String,
    /// Product family.
    pub family: String,
    /// Manufacturers of the model.
    pub manufacturers: Vec<String>,
    /// Part number.
    pub part_number: String,
    /// External link.
    pub link: String,
    /// Schema-validated extensions.
    pub extensions: Extensions,
    /// Schema used to validate `extensions`.
    pub schema_id: String,
}

/// One physical unit of a [`Uut`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UutInstance {
    /// Service-assigned identifier, empty before creation.
    pub id: String,
    /// The model this unit is an instance of.
    pub uut_id: String,
    /// Serial number.
    pub serial_number: String,
    /// Manufacture date as reported.
    pub manufacture_date: String,
    /// Firmware version.
    pub firmware_version: String,
    /// Hardware version.
    pub hardware_version: String,
    /// External link.
    pub link: String,
    /// Schema-validated extensions.
    pub extensions: Extensions,
    /// Schema used to validate `extensions`.
    pub schema_id: String,
}

/// A person running tests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Operator {
    /// Service-assigned identifier, empty before creation.
    pub id: String,
    /// Operator name.
    pub name: String,
    /// Operator role.
    pub role: String,
    /// External link.
    pub link: String,
    /// Schema-validated extensions.
    pub extensions: Extensions,
    /// Schema used to validate `extensions`.
    pub schema_id: String,
}

/// A station tests run on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestStation {
    /// Service-assigned identifier, empty before creation.
    pub id: String,
    /// Station name.
    pub name: String,
    /// Asset identifier.
    pub asset_identifier: String,
    /// External link.
    pub link: String,
    /// Schema-validated extensions.
    pub extensions: Extensions,
    /// Schema used to validate `extensions`.
    pub schema_id: String,
}

/// An instrument or fixture used during a test.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HardwareItem {
    /// Service-assigned identifier, empty before creation.
    pub id: String,
    /// Manufacturer.
    pub manufacturer: String,
    /// Model.
    pub model: String,
    /// Serial number.
    pub serial_number: String,
    /// Part number.
    pub part_number: String,
    /// Asset identifier.
    pub asset_identifier: String,
    /// Calibration due date as reported.
    pub calibration_due_date: String,
    /// External link.
    pub link: String,
    /// Schema-validated extensions.
    pub extensions: Extensions,
    /// Schema used to validate `extensions`.
    pub schema_id: String,
}

/// A software product used during a test.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SoftwareItem {
    /// Service-assigned identifier, empty before creation.
    pub id: String,
    /// Product name.
    pub product: String,
    /// Product version.
    pub version: String,
    /// External link.
    pub link: String,
    /// Schema-validated extensions.
    pub extensions: Extensions,
    /// Schema used to validate `extensions`.
    pub schema_id: String,
}

/// A board or fixture connecting the UUT to the test system.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestAdapter {
    /// Service-assigned identifier, empty before creation.
    pub id: String,
    /// Adapter name.
    pub name: String,
    /// Manufacturer.
    pub manufacturer: String,
    /// Model.
    pub model: String,
    /// Serial number.
    pub serial_number: String,
    /// Part number.
    pub part_number: String,
    /// Asset identifier.
    pub asset_identifier: String,
    /// Calibration due date as reported.
    pub calibration_due_date: String,
    /// External link.
    pub link: String,
    /// Schema-validated extensions.
    pub extensions: Extensions,
    /// Schema used to validate `extensions`.
    pub schema_id: String,
}

/// A test procedure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Test {
    /// Service-assigned identifier, empty before creation.
    pub id: String,
    /// Test name.
    pub test_name: String,
    /// What the test does.
    pub description: String,
    /// External link.
    pub link: String,
    /// Schema-validated extensions.
    pub extensions: Extensions,
    /// Schema used to validate `extensions`.
    pub schema_id: String,
}

/// The test plan written for one [`Uut`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestDescription {
    /// Service-assigned identifier, empty before creation.
    pub id: String,
    /// The model this description applies to.
    pub uut_id: String,
    /// Description name.
    pub name: String,
    /// External link.
    pub link: String,
    /// Schema-validated extensions.
    pub extensions: Extensions,
    /// Schema used to validate `extensions`.
    pub schema_id: String,
}

/// Kind of entity an [`Alias`] points at.
///
/// Discriminants match the wire enum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AliasTargetType {
    /// Not reported.
    #[default]
    Unspecified = 0,
    /// [`UutInstance`]
    UutInstance = 1,
    /// [`Uut`]
    Uut = 2,
    /// [`HardwareItem`]
    HardwareItem = 3,
    /// [`SoftwareItem`]
    SoftwareItem = 4,
    /// [`Operator`]
    Operator = 5,
    /// [`TestDescription`]
    TestDescription = 6,
    /// [`Test`]
    Test = 7,
    /// [`TestStation`]
    TestStation = 8,
    /// [`TestAdapter`]
    TestAdapter = 9,
}

/// A registered alias and the entity it resolves to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alias {
    /// Alias name.
    pub name: String,
    /// Kind of the aliased entity.
    pub target_type: AliasTargetType,
    /// Id of the aliased entity.
    pub target_id: String,
}

/// The entity an alias is registered against. It must already exist.
#[derive(Debug, Clone, PartialEq)]
pub enum AliasTarget {
    /// Alias a UUT instance
    UutInstance(UutInstance),
    /// Alias a UUT
    Uut(Uut),
    /// Alias a hardware item
    HardwareItem(HardwareItem),
    /// Alias a software item
    SoftwareItem(SoftwareItem),
    /// Alias an operator
    Operator(Operator),
    /// Alias a test description
    TestDescription(TestDescription),
    /// Alias a test
    Test(Test),
    /// Alias a test station
    TestStation(TestStation),
    /// Alias a test adapter
    TestAdapter(TestAdapter),
}

impl AliasTarget {
    /// Kind of the wrapped entity.
    #[must_use]
    pub fn target_type(&self) -> AliasTargetType {
        match self {
            AliasTarget::UutInstance(_) => AliasTargetType::UutInstance,
            AliasTarget::Uut(_) => AliasTargetType::Uut,
            AliasTarget::HardwareItem(_) => AliasTargetType::HardwareItem,
            AliasTarget::SoftwareItem(_) => AliasTargetType::SoftwareItem,
            AliasTarget::Operator(_) => AliasTargetType::Operator,
            AliasTarget::TestDescription(_) => AliasTargetType::TestDescription,
            AliasTarget::Test(_) => AliasTargetType::Test,
            AliasTarget::TestStation(_) => AliasTargetType::TestStation,
            AliasTarget::TestAdapter(_) => AliasTargetType::TestAdapter,
        }
    }
}

macro_rules! alias_target_from {
    ($($entity:ident),* $(,)?) => {
        $(
            impl From<$entity> for AliasTarget {
                fn from(entity: $entity) -> Self {
                    AliasTarget::$entity(entity)
                }
            }
        )*
    };
}

alias_target_from!(
    UutInstance,
    Uut,
    HardwareItem,
    SoftwareItem,
    Operator,
    TestDescription,
    Test,
    TestStation,
    TestAdapter,
);

/// Everything created from one JSON metadata document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataItems {
    /// Created UUTs.
    pub uuts: Vec<Uut>,
    /// Created UUT instances.
    pub uut_instances: Vec<UutInstance>,
    /// Created operators.
    pub operators: Vec<Operator>,
    /// Created test descriptions.
    pub test_descriptions: Vec<TestDescription>,
    /// Created tests.
    pub tests: Vec<Test>,
    /// Created test stations.
    pub test_stations: Vec<TestStation>,
    /// Created hardware items.
    pub hardware_items: Vec<HardwareItem>,
    /// Created software items.
    pub software_items: Vec<SoftwareItem>,
    /// Created test adapters.
    pub test_adapters: Vec<TestAdapter>,
    /// Aliases registered by the document.
    pub aliases: Vec<Alias>,
}

/// A registered extension schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionSchema {
    /// Service-assigned identifier.
    pub id: String,
    /// Schema text as registered.
    pub schema: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alias_target_type_discriminants_are_stable() {
        assert_eq!(AliasTargetType::Unspecified as i32, 0);
        assert_eq!(AliasTargetType::UutInstance as i32, 1);
        assert_eq!(AliasTargetType::Operator as i32, 5);
        assert_eq!(AliasTargetType::TestAdapter as i32, 9);
    }

    #[test]
    fn alias_target_reports_its_kind() {
        let target = AliasTarget::from(Test {
            test_name: "Power-on".into(),
            ..Default::default()
        });
        assert_eq!(target.target_type(), AliasTargetType::Test);
        assert_eq!(
            AliasTarget::from(TestStation::default()).target_type(),
            AliasTargetType::TestStation
        );
    }
}
