//! Audio capture.
//!
//! One cpal input stream at a time feeds a shared mono ring buffer.
//! Switching devices tears the previous stream down before the next one is
//! built, so two device locks are never held at once. Every failure path
//! logs and degrades to silence; the render loop never stops for audio.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Stream, StreamConfig};
use std::sync::{Arc, Mutex};

pub const BUFFER_SIZE: usize = 1024;

struct DeviceEntry {
    device: cpal::Device,
    name: String,
    is_input: bool,
}

pub struct SourcePipe {
    buffer: Arc<Mutex<Vec<f32>>>,
    devices: Vec<DeviceEntry>,
    current: usize,
    stream: Option<Stream>,
}

impl SourcePipe {
    /// Open the preferred device: `restore` by name if it still exists,
    /// otherwise the first input device.
    pub fn new(restore: Option<&str>) -> Self {
        let devices = collect_devices();
        let current = restore
            .and_then(|name| devices.iter().position(|d| d.name == name))
            .or_else(|| devices.iter().position(|d| d.is_input))
            .unwrap_or(0);

        let mut pipe = Self {
            buffer: Arc::new(Mutex::new(vec![0.0; BUFFER_SIZE])),
            devices,
            current,
            stream: None,
        };
        pipe.open(current);
        pipe
    }

    pub fn device_name(&self) -> &str {
        self.devices
            .get(self.current)
            .map(|d| d.name.as_str())
            .unwrap_or("none")
    }

    /// Cycle to the next capture device. Returns the new device name and
    /// whether its stream came up.
    pub fn select_next(&mut self) -> (String, bool) {
        if self.devices.is_empty() {
            return ("none".to_string(), false);
        }
        let next = (self.current + 1) % self.devices.len();
        let ok = self.open(next);
        (self.device_name().to_string(), ok)
    }

    fn open(&mut self, index: usize) -> bool {
        // Release the current stream first; holding the microphone while
        // grabbing a loopback device deadlocks some backends.
        self.stream = None;
        if let Ok(mut buffer) = self.buffer.lock() {
            buffer.iter_mut().for_each(|s| *s = 0.0);
        }

        let entry = match self.devices.get(index) {
            Some(e) => e,
            None => return false,
        };
        self.current = index;

        match build_stream(&entry.device, Arc::clone(&self.buffer)) {
            Some(stream) => {
                println!("Audio source: {}", entry.name);
                self.stream = Some(stream);
                true
            }
            None => {
                eprintln!("Audio source {} unavailable, running silent", entry.name);
                false
            }
        }
    }

    /// Snapshot of the newest samples. Returns the last captured content
    /// (or silence) when the stream is down.
    pub fn samples(&self) -> Vec<f32> {
        self.buffer
            .lock()
            .map(|b| b.clone())
            .unwrap_or_else(|_| vec![0.0; BUFFER_SIZE])
    }
}

fn collect_devices() -> Vec<DeviceEntry> {
    let host = cpal::default_host();
    let mut devices = Vec::new();

    if let Ok(inputs) = host.input_devices() {
        for device in inputs {
            if let Ok(name) = device.name() {
                devices.push(DeviceEntry {
                    device,
                    name,
                    is_input: true,
                });
            }
        }
    }
    // Output devices double as loopback sources on backends that allow it.
    if let Ok(outputs) = host.output_devices() {
        for device in outputs {
            if let Ok(name) = device.name() {
                devices.push(DeviceEntry {
                    device,
                    name,
                    is_input: false,
                });
            }
        }
    }

    if devices.is_empty() {
        eprintln!("No audio devices found");
    }
    devices
}

fn build_stream(device: &cpal::Device, buffer: Arc<Mutex<Vec<f32>>>) -> Option<Stream> {
    let config: StreamConfig = match device.default_input_config() {
        Ok(c) => c.into(),
        Err(e) => {
            eprintln!("No input config: {}", e);
            return None;
        }
    };
    let channels = config.channels as usize;

    let stream = device.build_input_stream(
        &config,
        move |data: &[f32], _: &cpal::InputCallbackInfo| {
            let mut buffer = match buffer.lock() {
                Ok(b) => b,
                Err(_) => return,
            };
            for frame in data.chunks(channels) {
                let mono: f32 = frame.iter().sum::<f32>() / channels as f32;
                buffer.remove(0);
                buffer.push(mono);
            }
        },
        |err| eprintln!("Audio stream error: {}", err),
        None,
    );

    match stream {
        Ok(s) => match s.play() {
            Ok(()) => Some(s),
            Err(e) => {
                eprintln!("Failed to start stream: {}", e);
                None
            }
        },
        Err(e) => {
            eprintln!("Failed to build stream: {}", e);
            None
        }
    }
}
