//! Texts sent to the remote user.

use crate::models::{FieldStats, Measurement, Statistics};

pub const ACCESS_DENIED: &str = "Access denied.";

pub const MENU_TITLE: &str = "Menu:";

pub fn measurement_summary(measurement: &Measurement) -> String {
    format!(
        "New measurement:\nTemperature: {:.2}°C\nHumidity: {:.2}%\nPressure: {:.2} hPa",
        measurement.temperature, measurement.humidity, measurement.pressure
    )
}

pub fn temperature_warning(temperature: f64) -> String {
    format!("Warning! Temperature out of range: {temperature:.2}°C")
}

pub fn current_readings(measurement: &Measurement) -> String {
    format!(
        "Current:\nTemperature: {:.2}°C\nHumidity: {:.2}%\nPressure: {:.2} hPa",
        measurement.temperature, measurement.humidity, measurement.pressure
    )
}

pub fn error(error: &dyn std::fmt::Display) -> String {
    format!("Error: {error}")
}

pub fn statistics(statistics: &Statistics) -> String {
    match statistics {
        Statistics::NoData { .. } => String::from("No data for the period."),
        Statistics::Summary(summary) => format!(
            "Statistics for {} days:\n{}\n{}\n{}",
            summary.period_days,
            field_line("Temperature", &summary.temperature),
            field_line("Humidity", &summary.humidity),
            field_line("Pressure", &summary.pressure),
        ),
    }
}

fn field_line(label: &str, stats: &FieldStats) -> String {
    format!(
        "{label}: min {:.2}, max {:.2}, mean {:.2}",
        stats.min, stats.max, stats.mean
    )
}
