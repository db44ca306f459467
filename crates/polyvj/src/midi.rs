//! Control-surface input.
//!
//! midir connections forward raw 3-byte messages over a channel into the
//! render loop; the core decides what they mean. Connections honor the
//! persisted input filter and are rebuilt (old ones dropped first) on
//! every rescan or filter change.

use midir::{Ignore, MidiInput, MidiInputConnection};
use polyvj_core::control::InputFilter;
use std::sync::mpsc::{channel, Receiver, Sender};

const CLIENT_NAME: &str = "polyvj";

pub struct MidiHub {
    connections: Vec<MidiInputConnection<()>>,
    port_names: Vec<String>,
    tx: Sender<[u8; 3]>,
    rx: Receiver<[u8; 3]>,
}

impl MidiHub {
    pub fn new() -> Self {
        let (tx, rx) = channel();
        Self {
            connections: Vec::new(),
            port_names: Vec::new(),
            tx,
            rx,
        }
    }

    /// Names of the ports seen on the last scan.
    pub fn port_names(&self) -> &[String] {
        &self.port_names
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Rescan ports and connect to everything the filter accepts.
    pub fn connect(&mut self, filter: &InputFilter) {
        // Drop existing connections before opening new ones.
        self.connections.clear();
        self.port_names.clear();

        let scan = match MidiInput::new(CLIENT_NAME) {
            Ok(input) => input,
            Err(e) => {
                eprintln!("MIDI unavailable: {}", e);
                return;
            }
        };

        for port in scan.ports() {
            let name = match scan.port_name(&port) {
                Ok(name) => name,
                Err(_) => continue,
            };
            self.port_names.push(name.clone());

            if !filter.accepts(&name) {
                continue;
            }

            // midir consumes one MidiInput per connection.
            let mut input = match MidiInput::new(CLIENT_NAME) {
                Ok(input) => input,
                Err(_) => continue,
            };
            input.ignore(Ignore::All);

            let tx = self.tx.clone();
            match input.connect(
                &port,
                "polyvj-in",
                move |_stamp, message, _| {
                    if message.len() >= 3 {
                        let _ = tx.send([message[0], message[1], message[2]]);
                    }
                },
                (),
            ) {
                Ok(connection) => {
                    println!("MIDI input: {}", name);
                    self.connections.push(connection);
                }
                Err(e) => eprintln!("MIDI connect failed for {}: {}", name, e),
            }
        }

        if self.connections.is_empty() {
            println!("No MIDI inputs connected");
        }
    }

    /// Messages received since the last drain.
    pub fn drain(&mut self) -> Vec<[u8; 3]> {
        self.rx.try_iter().collect()
    }
}

impl Default for MidiHub {
    fn default() -> Self {
        Self::new()
    }
}
