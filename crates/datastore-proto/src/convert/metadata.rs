//! Metadata store entity conversions.

use super::records::{extensions_from_proto, extensions_to_proto};
use super::ToDomain;
use crate::metadata as proto;
use datastore_core::metadata::{
    Alias, AliasTarget, AliasTargetType, ExtensionSchema, HardwareItem, MetadataItems, Operator,
    SoftwareItem, Test, TestAdapter, TestDescription, TestStation, Uut, UutInstance,
};

impl From<&Uut> for proto::Uut {
    fn from(uut: &Uut) -> Self {
        proto::Uut {
            id: uut.id.clone(),
            model_name: uut.model_name.clone(),
            family: uut.family.clone(),
            manufacturers: uut.manufacturers.clone(),
            part_number: uut.part_number.clone(),
            link: uut.link.clone(),
            extensions: extensions_to_proto(&uut.extensions),
            schema_id: uut.schema_id.clone(),
        }
    }
}

impl ToDomain<Uut> for proto::Uut {
    fn to_domain(self) -> Uut {
        Uut {
            id: self.id,
            model_name: self.model_name,
            family: self.family,
            manufacturers: self.manufacturers,
            part_number: self.part_number,
            link: self.link,
            extensions: extensions_from_proto(self.extensions),
            schema_id: self.schema_id,
        }
    }
}

impl From<&UutInstance> for proto::UutInstance {
    fn from(instance: &UutInstance) -> Self {
        proto::UutInstance {
            id: instance.id.clone(),
            uut_id: instance.uut_id.clone(),
            serial_number: instance.serial_number.clone(),
            manufacture_date: instance.manufacture_date.clone(),
            firmware_version: instance.firmware_version.clone(),
            hardware_version: instance.hardware_version.clone(),
            link: instance.link.clone(),
            extensions: extensions_to_proto(&instance.extensions),
            schema_id: instance.schema_id.clone(),
        }
    }
}

impl ToDomain<UutInstance> for proto::UutInstance {
    fn to_domain(self) -> UutInstance {
        UutInstance {
            id: self.id,
            uut_id: self.uut_id,
            serial_number: self.serial_number,
            manufacture_date: self.manufacture_date,
            firmware_version: self.firmware_version,
            hardware_version: self.hardware_version,
            link: self.link,
            extensions: extensions_from_proto(self.extensions),
            schema_id: self.schema_id,
        }
    }
}

impl From<&Operator> for proto::Operator {
    fn from(operator: &Operator) -> Self {
        proto::Operator {
            id: operator.id.clone(),
            name: operator.name.clone(),
            role: operator.role.clone(),
            link: operator.link.clone(),
            extensions: extensions_to_proto(&operator.extensions),
            schema_id: operator.schema_id.clone(),
        }
    }
}

impl ToDomain<Operator> for proto::Operator {
    fn to_domain(self) -> Operator {
        Operator {
            id: self.id,
            name: self.name,
            role: self.role,
            link: self.link,
            extensions: extensions_from_proto(self.extensions),
            schema_id: self.schema_id,
        }
    }
}

impl From<&TestStation> for proto::TestStation {
    fn from(station: &TestStation) -> Self {
        proto::TestStation {
            id: station.id.clone(),
            name: station.name.clone(),
            asset_identifier: station.asset_identifier.clone(),
            link: station.link.clone(),
            extensions: extensions_to_proto(&station.extensions),
            schema_id: station.schema_id.clone(),
        }
    }
}

impl ToDomain<TestStation> for proto::TestStation {
    fn to_domain(self) -> TestStation {
        TestStation {
            id: self.id,
            name: self.name,
            asset_identifier: self.asset_identifier,
            link: self.link,
            extensions: extensions_from_proto(self.extensions),
            schema_id: self.schema_id,
        }
    }
}

impl From<&HardwareItem> for proto::HardwareItem {
    fn from(item: &HardwareItem) -> Self {
        proto::HardwareItem {
            id: item.id.clone(),
            manufacturer: item.manufacturer.clone(),
            model: item.model.clone(),
            serial_number: item.serial_number.clone(),
            part_number: item.part_number.clone(),
            asset_identifier: item.asset_identifier.clone(),
            calibration_due_date: item.calibration_due_date.clone(),
            link: item.link.clone(),
            extensions: extensions_to_proto(&item.extensions),
            schema_id: item.schema_id.clone(),
        }
    }
}

impl ToDomain<HardwareItem> for proto::HardwareItem {
    fn to_domain(self) -> HardwareItem {
        HardwareItem {
            id: self.id,
            manufacturer: self.manufacturer,
            model: self.model,
            serial_number: self.serial_number,
            part_number: self.part_number,
            asset_identifier: self.asset_identifier,
            calibration_due_date: self.calibration_due_date,
            link: self.link,
            extensions: extensions_from_proto(self.extensions),
            schema_id: self.schema_id,
        }
    }
}

impl From<&SoftwareItem> for proto::SoftwareItem {
    fn from(item: &SoftwareItem) -> Self {
        proto::SoftwareItem {
            id: item.id.clone(),
            product: item.product.clone(),
            version: item.version.clone(),
            link: item.link.clone(),
            extensions: extensions_to_proto(&item.extensions),
            schema_id: item.schema_id.clone(),
        }
    }
}

impl ToDomain<SoftwareItem> for proto::SoftwareItem {
    fn to_domain(self) -> SoftwareItem {
        SoftwareItem {
            id: self.id,
            product: self.product,
            version: self.version,
            link: self.link,
            extensions: extensions_from_proto(self.extensions),
            schema_id: self.schema_id,
        }
    }
}

impl From<&TestAdapter> for proto::TestAdapter {
    fn from(adapter: &TestAdapter) -> Self {
        proto::TestAdapter {
            id: adapter.id.clone(),
            name: adapter.name.clone(),
            manufacturer: adapter.manufacturer.clone(),
            model: adapter.model.clone(),
            serial_number: adapter.serial_number.clone(),
            part_number: adapter.part_number.clone(),
            asset_identifier: adapter.asset_identifier.clone(),
            calibration_due_date: adapter.calibration_due_date.clone(),
            link: adapter.link.clone(),
            extensions: extensions_to_proto(&adapter.extensions),
            schema_id: adapter.schema_id.clone(),
        }
    }
}

impl ToDomain<TestAdapter> for proto::TestAdapter {
    fn to_domain(self) -> TestAdapter {
        TestAdapter {
            id: self.id,
            name: self.name,
            manufacturer: self.manufacturer,
            model: self.model,
            serial_number: self.serial_number,
            part_number: self.part_number,
            asset_identifier: self.asset_identifier,
            calibration_due_date: self.calibration_due_date,
            link: self.link,
            extensions: extensions_from_proto(self.extensions),
            schema_id: self.schema_id,
        }
    }
}

impl From<&Test> for proto::Test {
    fn from(test: &Test) -> Self {
        proto::Test {
            id: test.id.clone(),
            test_name: test.test_name.clone(),
            description: test.description.clone(),
            link: test.link.clone(),
            extensions: extensions_to_proto(&test.extensions),
            schema_id: test.schema_id.clone(),
        }
    }
}

impl ToDomain<Test> for proto::Test {
    fn to_domain(self) -> Test {
        Test {
            id: self.id,
            test_name: self.test_name,
            description: self.description,
            link: self.link,
            extensions: extensions_from_proto(self.extensions),
            schema_id: self.schema_id,
        }
    }
}

impl From<&TestDescription> for proto::TestDescription {
    fn from(description: &TestDescription) -> Self {
        proto::TestDescription {
            id: description.id.clone(),
            uut_id: description.uut_id.clone(),
            name: description.name.clone(),
            link: description.link.clone(),
            extensions: extensions_to_proto(&description.extensions),
            schema_id: description.schema_id.clone(),
        }
    }
}

impl ToDomain<TestDescription> for proto::TestDescription {
    fn to_domain(self) -> TestDescription {
        TestDescription {
            id: self.id,
            uut_id: self.uut_id,
            name: self.name,
            link: self.link,
            extensions: extensions_from_proto(self.extensions),
            schema_id: self.schema_id,
        }
    }
}

// Aliases

impl From<AliasTargetType> for proto::AliasTargetType {
    fn from(target_type: AliasTargetType) -> Self {
        match target_type {
            AliasTargetType::Unspecified => proto::AliasTargetType::Unspecified,
            AliasTargetType::UutInstance => proto::AliasTargetType::UutInstance,
            AliasTargetType::Uut => proto::AliasTargetType::Uut,
            AliasTargetType::HardwareItem => proto::AliasTargetType::HardwareItem,
            AliasTargetType::SoftwareItem => proto::AliasTargetType::SoftwareItem,
            AliasTargetType::Operator => proto::AliasTargetType::Operator,
            AliasTargetType::TestDescription => proto::AliasTargetType::TestDescription,
            AliasTargetType::Test => proto::AliasTargetType::Test,
            AliasTargetType::TestStation => proto::AliasTargetType::TestStation,
            AliasTargetType::TestAdapter => proto::AliasTargetType::TestAdapter,
        }
    }
}

impl ToDomain<AliasTargetType> for proto::AliasTargetType {
    fn to_domain(self) -> AliasTargetType {
        match self {
            proto::AliasTargetType::Unspecified => AliasTargetType::Unspecified,
            proto::AliasTargetType::UutInstance => AliasTargetType::UutInstance,
            proto::AliasTargetType::Uut => AliasTargetType::Uut,
            proto::AliasTargetType::HardwareItem => AliasTargetType::HardwareItem,
            proto::AliasTargetType::SoftwareItem => AliasTargetType::SoftwareItem,
            proto::AliasTargetType::Operator => AliasTargetType::Operator,
            proto::AliasTargetType::TestDescription => AliasTargetType::TestDescription,
            proto::AliasTargetType::Test => AliasTargetType::Test,
            proto::AliasTargetType::TestStation => AliasTargetType::TestStation,
            proto::AliasTargetType::TestAdapter => AliasTargetType::TestAdapter,
        }
    }
}

/// Alias target kind from its raw wire value; unknown values read as unspecified.
#[must_use]
pub fn alias_target_type_from_wire(value: i32) -> AliasTargetType {
    proto::AliasTargetType::try_from(value)
        .unwrap_or(proto::AliasTargetType::Unspecified)
        .to_domain()
}

impl From<&Alias> for proto::Alias {
    fn from(alias: &Alias) -> Self {
        proto::Alias {
            name: alias.name.clone(),
            target_type: proto::AliasTargetType::from(alias.target_type) as i32,
            target_id: alias.target_id.clone(),
        }
    }
}

impl ToDomain<Alias> for proto::Alias {
    fn to_domain(self) -> Alias {
        Alias {
            name: self.name,
            target_type: alias_target_type_from_wire(self.target_type),
            target_id: self.target_id,
        }
    }
}

impl From<&AliasTarget> for proto::create_alias_request::AliasTarget {
    fn from(target: &AliasTarget) -> Self {
        use proto::create_alias_request::AliasTarget as Wire;
        match target {
            AliasTarget::UutInstance(e) => Wire::UutInstance(e.into()),
            AliasTarget::Uut(e) => Wire::Uut(e.into()),
            AliasTarget::HardwareItem(e) => Wire::HardwareItem(e.into()),
            AliasTarget::SoftwareItem(e) => Wire::SoftwareItem(e.into()),
            AliasTarget::Operator(e) => Wire::Operator(e.into()),
            AliasTarget::TestDescription(e) => Wire::TestDescription(e.into()),
            AliasTarget::Test(e) => Wire::Test(e.into()),
            AliasTarget::TestStation(e) => Wire::TestStation(e.into()),
            AliasTarget::TestAdapter(e) => Wire::TestAdapter(e.into()),
        }
    }
}

fn all<P: ToDomain<T>, T>(items: Vec<P>) -> Vec<T> {
    items.into_iter().map(ToDomain::to_domain).collect()
}

impl ToDomain<MetadataItems> for proto::CreateFromJsonDocumentResponse {
    fn to_domain(self) -> MetadataItems {
        MetadataItems {
            uuts: all(self.uuts),
            uut_instances: all(self.uut_instances),
            operators: all(self.operators),
            test_descriptions: all(self.test_descriptions),
            tests: all(self.tests),
            test_stations: all(self.test_stations),
            hardware_items: all(self.hardware_items),
            software_items: all(self.software_items),
            test_adapters: all(self.test_adapters),
            aliases: all(self.aliases),
        }
    }
}

impl ToDomain<ExtensionSchema> for proto::ExtensionSchema {
    fn to_domain(self) -> ExtensionSchema {
        ExtensionSchema {
            id: self.id,
            schema: self.schema,
        }
    }
}
