//! Data type tags and unit names understood by the Cayenne dashboard.
//!
//! ```ignore
//! client
//!     .publish_number(Topic::Data, Channel::Id(0), Some(data_type::TEMPERATURE), Some(unit::CELSIUS), 30.5, None)
//!     .await?;
//! ```

/// Data type tags, sent before the `=` of a data payload.
pub mod data_type {
    pub const BAROMETRIC_PRESSURE: &str = "bp";
    pub const BATTERY: &str = "batt";
    pub const LUMINOSITY: &str = "lum";
    pub const PROXIMITY: &str = "prox";
    pub const RELATIVE_HUMIDITY: &str = "rel_hum";
    pub const TEMPERATURE: &str = "temp";
    pub const VOLTAGE: &str = "voltage";
    pub const DIGITAL_SENSOR: &str = "digital_sensor";
    pub const ANALOG_SENSOR: &str = "analog_sensor";
    pub const DIGITAL_ACTUATOR: &str = "digital_actuator";
    pub const ANALOG_ACTUATOR: &str = "analog_actuator";
}

/// Unit names, sent after the `:` of a value group.
pub mod unit {
    pub const UNDEFINED: &str = "null";
    pub const PASCAL: &str = "pa";
    pub const HECTOPASCAL: &str = "hpa";
    pub const PERCENT: &str = "p";
    pub const RATIO: &str = "r";
    pub const VOLTS: &str = "v";
    pub const MILLIVOLTS: &str = "mv";
    pub const LUX: &str = "lux";
    pub const CENTIMETER: &str = "cm";
    pub const METER: &str = "m";
    pub const DIGITAL: &str = "d";
    pub const FAHRENHEIT: &str = "f";
    pub const CELSIUS: &str = "c";
    pub const KELVIN: &str = "k";
}
