use crate::error::{Result, SoundboardError};
use cpal::traits::{DeviceTrait, HostTrait};
use cpal::Device;

pub fn get_input_devices() -> Result<Vec<(String, Device)>> {
    let host = cpal::default_host();
    let devices = host.input_devices().map_err(SoundboardError::device)?;
    Ok(devices
        .filter_map(|device| device.name().ok().map(|name| (name, device)))
        .collect())
}

pub fn get_output_devices() -> Result<Vec<(String, Device)>> {
    let host = cpal::default_host();
    let devices = host.output_devices().map_err(SoundboardError::device)?;
    Ok(devices
        .filter_map(|device| device.name().ok().map(|name| (name, device)))
        .collect())
}

/// Resolves the named input device, or the host default when no name is configured.
pub fn find_input_device(name: Option<&str>) -> Result<Device> {
    match name {
        Some(name) => get_input_devices()?
            .into_iter()
            .find(|(n, _)| n == name)
            .map(|(_, device)| device)
            .ok_or_else(|| SoundboardError::InputDeviceNotFound(name.to_string())),
        None => cpal::default_host()
            .default_input_device()
            .ok_or(SoundboardError::NoInputDevice),
    }
}

pub fn find_output_device(name: Option<&str>) -> Result<Device> {
    match name {
        Some(name) => get_output_devices()?
            .into_iter()
            .find(|(n, _)| n == name)
            .map(|(_, device)| device)
            .ok_or_else(|| SoundboardError::OutputDeviceNotFound(name.to_string())),
        None => cpal::default_host()
            .default_output_device()
            .ok_or(SoundboardError::NoOutputDevice),
    }
}

pub fn device_name(device: &Device) -> String {
    device.name().unwrap_or_else(|_| "<unnamed device>".to_string())
}
