use std::{
    io::Write,
    sync::{Mutex, MutexGuard, PoisonError, TryLockError},
};

use bytes::Buf;

use crate::{
    config::ClientConfig,
    error::Result,
    link::{Connector, LocalConnector, Wait},
    misc::buf::{BufExt, Decode, DecodeError},
};

use self::{defs::*, protocol::*};

pub mod defs;
pub mod protocol;

#[cfg(test)]
mod fake;

/// Request/response client for the EC fan service.
///
/// Every operation announces its command on the control channel, then
/// performs one exchange on the command's own channel. The service cannot
/// tell concurrent announcements apart, so the whole sequence runs under a
/// single lock and the client can be shared between threads.
pub struct EcLinkClient<C = LocalConnector> {
    connector: C,
    control_channel: String,
    probe_marker: String,
    lock: Mutex<()>,
}

impl EcLinkClient {
    pub fn new() -> Self {
        Self::from_config(&ClientConfig::default())
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::with_connector(LocalConnector::new(config), config)
    }
}

impl Default for EcLinkClient {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Connector> EcLinkClient<C> {
    pub fn with_connector(connector: C, config: &ClientConfig) -> Self {
        EcLinkClient {
            connector,
            control_channel: config.control_channel.clone(),
            probe_marker: config.probe_marker.clone(),
            lock: Mutex::new(()),
        }
    }

    /* == Generic execution == */

    /// Runs the announce/exchange pair for any command and decodes its reply.
    pub fn execute(&self, command: Command) -> Result<Reply> {
        self.request(command, |buf| Reply::decode(&command, buf))
    }

    /* == Public API == */

    /// Zero-wait liveness check of the control channel.
    ///
    /// Does not queue behind an operation in flight. In that case it only
    /// checks that the control channel takes a connection and writes nothing,
    /// so the service never sees a stray token mid-exchange.
    pub fn is_server_started(&self) -> bool {
        let guard = match self.lock.try_lock() {
            Ok(guard) => Some(guard),
            Err(TryLockError::Poisoned(poisoned)) => Some(poisoned.into_inner()),
            Err(TryLockError::WouldBlock) => None,
        };

        let connection = self.connector.connect(&self.control_channel, Wait::Immediate);

        let mut stream = match connection {
            Ok(stream) => stream,
            Err(err) => {
                tracing::debug!("Liveness check of {} failed: {err}", self.control_channel);
                return false;
            }
        };

        if guard.is_none() {
            tracing::debug!(
                "Operation in flight, checked {} without a marker",
                self.control_channel
            );
            return true;
        }

        if let Err(err) = stream.write_all(self.probe_marker.as_bytes()) {
            tracing::warn!(
                "Connected to {} but the liveness marker was not delivered: {err}",
                self.control_channel
            );
        }

        true
    }

    pub fn init_io(&self) -> Result<bool> {
        self.request(Command::InitIo, |buf| Ok(buf.try_get_bool()?))
    }

    pub fn ec_version(&self) -> Result<String> {
        self.request(Command::Version, |buf| {
            Ok(buf.get_text(Command::VERSION_MAX_B))
        })
    }

    pub fn fan_count(&self) -> Result<i32> {
        self.count(Command::FanCount)
    }

    /// Raw divisor, see [`rpm_from_divisor`].
    pub fn cpu_fan_rpm(&self) -> Result<i32> {
        self.count(Command::CpuFanRpm)
    }

    /// Raw divisor, see [`rpm_from_divisor`].
    pub fn gpu_fan_rpm(&self) -> Result<i32> {
        self.count(Command::GpuFanRpm)
    }

    /// Raw divisor, see [`rpm_from_divisor`].
    pub fn gpu1_fan_rpm(&self) -> Result<i32> {
        self.count(Command::Gpu1FanRpm)
    }

    /// Raw divisor, see [`rpm_from_divisor`].
    pub fn x72_fan_rpm(&self) -> Result<i32> {
        self.count(Command::X72FanRpm)
    }

    pub fn temp_fan_duty(&self, fan: impl Into<FanId>) -> Result<EcSample> {
        self.request(Command::TempFanDuty(fan.into()), |buf| EcSample::decode(buf))
    }

    /// Sets a raw duty (0-255). The service does not acknowledge.
    pub fn set_fan_duty(&self, fan: impl Into<FanId>, duty: u32) -> Result<()> {
        let fan = fan.into();
        self.request(Command::SetFanDuty { fan, duty }, |_| Ok(()))
    }

    /// Hands the fan back to the EC's own control.
    pub fn set_fan_auto(&self, fan: impl Into<FanId>) -> Result<()> {
        self.request(Command::SetFanAuto(fan.into()), |_| Ok(()))
    }

    pub fn is_watchdog_started(&self) -> Result<bool> {
        self.request(Command::WatchDogStatus, |buf| Ok(buf.try_get_slot_bool()?))
    }

    pub fn start_watchdog(&self) -> Result<()> {
        self.request(Command::WatchDogStart, |_| Ok(()))
    }

    pub fn close_watchdog(&self) -> Result<()> {
        self.request(Command::WatchDogClose, |_| Ok(()))
    }

    /// Reads every telemetry value the service exposes, one operation at a time.
    pub fn snapshot(&self) -> Result<Telemetry> {
        let fan_count = self.fan_count()?;

        let rpm_divisors = FanRpms {
            cpu: self.cpu_fan_rpm()?,
            gpu: self.gpu_fan_rpm()?,
            gpu1: self.gpu1_fan_rpm()?,
            x72: self.x72_fan_rpm()?,
        };

        let samples = (0..fan_count.max(0) as u32)
            .map(FanId)
            .map(|fan| self.temp_fan_duty(fan).map(|sample| (fan, sample)))
            .collect::<Result<_>>()?;

        Ok(Telemetry {
            fan_count,
            rpm_divisors,
            samples,
        })
    }

    /* == Helpers == */

    /// Announces `command`, performs its exchange and decodes the raw reply.
    fn request<T>(
        &self,
        command: Command,
        decode: impl FnOnce(&mut &[u8]) -> Result<T, DecodeError>,
    ) -> Result<T> {
        let _guard = self.serialize();

        announce(
            &self.connector,
            &self.control_channel,
            command.token(),
            Wait::Blocking,
        )?;

        let reply = if command.has_exchange() {
            exchange(&self.connector, &command)?
        } else {
            Vec::new()
        };

        Ok(decode(&mut &reply[..])?)
    }

    fn serialize(&self) -> MutexGuard<'_, ()> {
        // The lock guards no data, a panicked holder leaves nothing to repair
        self.lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn count(&self, command: Command) -> Result<i32> {
        self.request(command, |buf| Ok(buf.try_get_i32_le()?))
    }
}
