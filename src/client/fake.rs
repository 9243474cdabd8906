use std::{
    collections::{HashMap, HashSet},
    io::{self, Cursor, Read, Write},
    sync::{Arc, Mutex, MutexGuard},
};

use crate::link::{Connector, Wait};

/// What the fake service observed, in order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    Opened(String),
    Closed {
        channel: String,
        written: Vec<u8>,
        unread: usize,
    },
}

#[derive(Default)]
struct State {
    replies: HashMap<String, Vec<u8>>,
    offline: HashSet<String>,
    events: Vec<Event>,
    open: usize,
}

/// In-memory stand-in for the EC service, counting every handle it hands out.
#[derive(Clone, Default)]
pub struct FakeService {
    state: Arc<Mutex<State>>,
}

pub struct FakeStream {
    channel: String,
    written: Vec<u8>,
    reply: Cursor<Vec<u8>>,
    state: Arc<Mutex<State>>,
}

impl FakeService {
    pub fn new() -> Self {
        FakeService::default()
    }

    pub fn reply(&self, channel: &str, bytes: &[u8]) -> &Self {
        self.lock().replies.insert(channel.to_owned(), bytes.to_vec());
        self
    }

    pub fn offline(&self, channel: &str) -> &Self {
        self.lock().offline.insert(channel.to_owned());
        self
    }

    pub fn events(&self) -> Vec<Event> {
        self.lock().events.clone()
    }

    pub fn open_handles(&self) -> usize {
        self.lock().open
    }

    /// Payloads written on every closed connection to `channel`.
    pub fn written(&self, channel: &str) -> Vec<Vec<u8>> {
        self.lock()
            .events
            .iter()
            .filter_map(|event| match event {
                Event::Closed {
                    channel: c,
                    written,
                    ..
                } if c == channel => Some(written.clone()),
                _ => None,
            })
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }
}

impl Connector for FakeService {
    type Stream = FakeStream;

    fn connect(&self, channel: &str, _wait: Wait) -> io::Result<FakeStream> {
        let mut state = self.lock();

        if state.offline.contains(channel) {
            return Err(io::ErrorKind::NotFound.into());
        }

        state.open += 1;
        state.events.push(Event::Opened(channel.to_owned()));

        let reply = state.replies.get(channel).cloned().unwrap_or_default();

        Ok(FakeStream {
            channel: channel.to_owned(),
            written: Vec::new(),
            reply: Cursor::new(reply),
            state: self.state.clone(),
        })
    }
}

impl Read for FakeStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reply.read(buf)
    }
}

impl Write for FakeStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for FakeStream {
    fn drop(&mut self) {
        let unread = self.reply.get_ref().len() - self.reply.position() as usize;
        let mut state = self.state.lock().unwrap();

        state.open -= 1;
        state.events.push(Event::Closed {
            channel: std::mem::take(&mut self.channel),
            written: std::mem::take(&mut self.written),
            unread,
        });
    }
}
