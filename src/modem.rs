use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError, bounded, unbounded};

use crate::audio::{AudioSink, AudioSource, DeviceSink, DeviceSource};
use crate::config::ModemConfig;
use crate::error::{ModemError, Result};
use crate::modulator::Modulator;
use crate::pipeline::ReceivePipeline;
use crate::turnaround::Turnaround;

/// Notifications delivered to the front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModemEvent {
    /// One character decoded off the air
    CharacterReceived(char),
    /// The transmitter started (true) or finished draining (false)
    Sending(bool),
    /// Playback stopped making progress; queued text was discarded and
    /// the transmit thread has exited
    TransmitFailed(String),
}

/// A running modem: capture and transmit threads against the sound devices.
pub struct Modem;

/// Front-end handle to a running modem.
///
/// `enqueue` is the only producer of the pending-text queue; the transmit
/// thread is the only consumer. Dropping the handle shuts the modem down.
pub struct ModemHandle {
    text_tx: Option<Sender<String>>,
    shutdown: Arc<AtomicBool>,
    receive_thread: Option<JoinHandle<()>>,
    transmit_thread: Option<JoinHandle<()>>,
}

impl Modem {
    /// Open both audio paths and start the receive and transmit threads.
    ///
    /// Device failures on either path are returned here; the modem cannot
    /// function without both. Decoded characters and sending-state changes
    /// arrive on `events`.
    pub fn start(config: ModemConfig, events: Sender<ModemEvent>) -> Result<ModemHandle> {
        let shutdown = Arc::new(AtomicBool::new(false));
        let turnaround = Turnaround::new(config.turnaround.guard_interval(&config.audio));
        let (text_tx, text_rx) = unbounded::<String>();

        // cpal streams stay on the thread that creates them, so each path
        // opens its own device and reports readiness back over a channel.
        let (rx_ready_tx, rx_ready_rx) = bounded::<Result<()>>(1);
        let receive_thread = {
            let config = config.clone();
            let events = events.clone();
            let turnaround = turnaround.clone();
            let shutdown = Arc::clone(&shutdown);
            thread::spawn(move || {
                let mut source = match DeviceSource::new(&config.audio) {
                    Ok(source) => {
                        let _ = rx_ready_tx.send(Ok(()));
                        source
                    }
                    Err(e) => {
                        let _ = rx_ready_tx.send(Err(e));
                        return;
                    }
                };
                let mut pipeline = ReceivePipeline::new(&config, turnaround);
                run_receive(&mut source, &mut pipeline, &events, &shutdown);
            })
        };
        rx_ready_rx.recv().map_err(|_| {
            ModemError::AudioStream("receive thread exited during startup".into())
        })??;

        let (tx_ready_tx, tx_ready_rx) = bounded::<Result<()>>(1);
        let transmit_thread = {
            let config = config.clone();
            let turnaround = turnaround.clone();
            let shutdown = Arc::clone(&shutdown);
            thread::spawn(move || {
                let mut sink = match DeviceSink::new(&config.audio) {
                    Ok(sink) => {
                        let _ = tx_ready_tx.send(Ok(()));
                        sink
                    }
                    Err(e) => {
                        let _ = tx_ready_tx.send(Err(e));
                        return;
                    }
                };
                let mut modulator = Modulator::new(&config.line, config.audio.sample_rate);
                run_transmit(
                    &mut modulator,
                    &mut sink,
                    &text_rx,
                    &turnaround,
                    &events,
                    &shutdown,
                );
            })
        };
        let tx_ready = tx_ready_rx.recv().map_err(|_| {
            ModemError::AudioStream("transmit thread exited during startup".into())
        });
        if let Err(e) = tx_ready.and_then(|r| r) {
            // Playback failed to open; don't leave the capture path running.
            shutdown.store(true, Ordering::SeqCst);
            let _ = receive_thread.join();
            return Err(e);
        }

        Ok(ModemHandle {
            text_tx: Some(text_tx),
            shutdown,
            receive_thread: Some(receive_thread),
            transmit_thread: Some(transmit_thread),
        })
    }
}

impl ModemHandle {
    /// Queue text for transmission, waking the transmit thread if idle.
    pub fn enqueue(&self, text: &str) {
        if let Some(ref tx) = self.text_tx
            && tx.send(text.to_string()).is_err()
        {
            log::warn!("transmit thread gone, dropping {} chars", text.len());
        }
    }

    /// Signal both threads to stop at their next block boundary and wait
    /// for them.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        self.text_tx.take();
        if let Some(handle) = self.receive_thread.take() {
            let _ = handle.join();
        }
        if let Some(handle) = self.transmit_thread.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for ModemHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_receive(
    source: &mut dyn AudioSource,
    pipeline: &mut ReceivePipeline,
    events: &Sender<ModemEvent>,
    shutdown: &AtomicBool,
) {
    while !shutdown.load(Ordering::SeqCst) {
        let block = match source.next_block() {
            Ok(Some(block)) => block,
            Ok(None) => {
                log::info!("capture source ended");
                break;
            }
            Err(e) => {
                log::error!("capture failed: {}", e);
                break;
            }
        };

        for c in pipeline.process_block(&block) {
            if events.send(ModemEvent::CharacterReceived(c)).is_err() {
                return;
            }
        }
    }
}

fn run_transmit(
    modulator: &mut Modulator,
    sink: &mut dyn AudioSink,
    text_rx: &Receiver<String>,
    turnaround: &Turnaround,
    events: &Sender<ModemEvent>,
    shutdown: &AtomicBool,
) {
    let mut sending = false;

    let finish = |sink: &mut dyn AudioSink, sending: &mut bool| {
        if !*sending {
            return;
        }
        // Only report idle once the device has actually played everything.
        if let Err(e) = sink.drain() {
            log::error!("drain failed: {}", e);
        }
        turnaround.end_sending();
        let _ = events.send(ModemEvent::Sending(false));
        *sending = false;
    };

    while !shutdown.load(Ordering::SeqCst) {
        let text = match text_rx.try_recv() {
            Ok(text) => text,
            Err(TryRecvError::Empty) => {
                finish(sink, &mut sending);
                match text_rx.recv_timeout(Duration::from_millis(200)) {
                    Ok(text) => text,
                    Err(RecvTimeoutError::Timeout) => continue,
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            Err(TryRecvError::Disconnected) => break,
        };

        if !sending {
            turnaround.begin_sending();
            let _ = events.send(ModemEvent::Sending(true));
            sending = true;
        }

        for c in text.chars() {
            if let Err(e) = modulator.send_char(sink, c) {
                // A stalled device will not recover for the characters
                // behind this one. Drop whatever is still queued, tell
                // the front end, and give the line back to the receiver.
                log::error!("transmit of {:?} failed: {}", c, e);
                while text_rx.try_recv().is_ok() {}
                let _ = events.send(ModemEvent::TransmitFailed(e.to_string()));
                finish(sink, &mut sending);
                return;
            }
        }
    }

    finish(sink, &mut sending);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LineConfig;

    /// Sink whose device never consumes anything.
    struct StalledSink;

    impl AudioSink for StalledSink {
        fn write(&mut self, _samples: &[i16]) -> Result<()> {
            Err(ModemError::PlaybackStalled(5.0))
        }

        fn drain(&mut self) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_stalled_playback_stops_transmit_and_reports() {
        let (text_tx, text_rx) = unbounded::<String>();
        let (event_tx, event_rx) = unbounded::<ModemEvent>();
        let turnaround = Turnaround::new(Duration::ZERO);
        let shutdown = AtomicBool::new(false);

        text_tx.send("HELLO".into()).unwrap();
        text_tx.send("WORLD".into()).unwrap();

        let mut modulator = Modulator::new(&LineConfig::default(), 8000);
        let mut sink = StalledSink;
        run_transmit(
            &mut modulator,
            &mut sink,
            &text_rx,
            &turnaround,
            &event_tx,
            &shutdown,
        );

        // The failure discards the rest of the queue instead of retrying
        // character by character.
        assert!(matches!(text_rx.try_recv(), Err(TryRecvError::Empty)));

        let events: Vec<ModemEvent> = event_rx.try_iter().collect();
        assert_eq!(events[0], ModemEvent::Sending(true));
        assert!(matches!(events[1], ModemEvent::TransmitFailed(_)));
        assert_eq!(events[2], ModemEvent::Sending(false));

        // The receiver gets the line back.
        assert!(!turnaround.is_suppressed());
    }
}
