use std::fmt;

use bytes::{Buf, BufMut};
use serde::Serialize;
use strum::{EnumDiscriminants, EnumIter, IntoStaticStr};

use crate::misc::buf::{BufExt, Decode, DecodeError, Encode};

/* == FanId == */

/// Selects a fan/sensor channel. The valid range is only known to the service.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub struct FanId(pub u32);

impl From<u32> for FanId {
    fn from(id: u32) -> Self {
        FanId(id)
    }
}

impl fmt::Display for FanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Encode for FanId {
    fn encode<B: BufMut>(&self, buf: &mut B) {
        buf.put_u32_le(self.0);
    }
}

/* == EcSample == */

/// Temperature and duty snapshot for one fan.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct EcSample {
    /// Remote sensor temperature (°C).
    pub remote: u8,
    /// Local sensor temperature (°C).
    pub local: u8,
    /// Raw duty, 0-255 for 0-100 %.
    pub fan_duty: u8,
    pub reserved: u8,
}

impl EcSample {
    /// Each field travels in its own 4-byte slot, 12 of these bytes are padding.
    pub const SIZE_B: usize = 16;

    pub fn duty_percent(&self) -> f32 {
        self.fan_duty as f32 * 100. / u8::MAX as f32
    }
}

impl Decode for EcSample {
    fn decode<B: Buf>(buf: &mut B) -> Result<Self, DecodeError> {
        Ok(EcSample {
            remote: buf.try_get_slot_u8()?,
            local: buf.try_get_slot_u8()?,
            fan_duty: buf.try_get_slot_u8()?,
            reserved: buf.try_get_slot_u8()?,
        })
    }
}

/* == Command == */

/// Every request understood by the EC service.
///
/// The discriminant's string form is the command token, which doubles as the
/// name of the per-command channel. Token spellings are part of the wire
/// protocol and must not be corrected.
#[derive(Copy, Clone, Debug, PartialEq, Eq, EnumDiscriminants)]
#[strum_discriminants(name(CommandKind), derive(EnumIter, IntoStaticStr, Hash))]
pub enum Command {
    #[strum_discriminants(strum(serialize = "ClevoEcPipeInitTo"))]
    InitIo,
    #[strum_discriminants(strum(serialize = "ClevoEcPipeVersion"))]
    Version,
    #[strum_discriminants(strum(serialize = "ClevoEcPipeFanNum"))]
    FanCount,
    #[strum_discriminants(strum(serialize = "ClevoEcPipeCpuFanRpm"))]
    CpuFanRpm,
    #[strum_discriminants(strum(serialize = "ClevoEcPipeGpuFanRpm"))]
    GpuFanRpm,
    #[strum_discriminants(strum(serialize = "ClevoEcPipeGpu1FanRpm"))]
    Gpu1FanRpm,
    #[strum_discriminants(strum(serialize = "ClevoEcPipeX72FanRpm"))]
    X72FanRpm,
    #[strum_discriminants(strum(serialize = "ClevoEcPipeTempFanDuty"))]
    TempFanDuty(FanId),
    #[strum_discriminants(strum(serialize = "ClevoEcPiceSetFanDuty"))]
    SetFanDuty { fan: FanId, duty: u32 },
    #[strum_discriminants(strum(serialize = "ClevoEcPiceSetFanAuto"))]
    SetFanAuto(FanId),
    #[strum_discriminants(strum(serialize = "WatchDogInitTo"))]
    WatchDogStatus,
    #[strum_discriminants(strum(serialize = "WatchDogStart"))]
    WatchDogStart,
    #[strum_discriminants(strum(serialize = "WatchDogClose"))]
    WatchDogClose,
}

/// Expected size of a reply on the per-command channel.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ReplyShape {
    None,
    /// Exactly this many bytes, anything less is a short read.
    Exact(usize),
    /// Up to this many bytes, the peer closing the channel ends the reply.
    UpTo(usize),
}

impl Command {
    pub const VERSION_MAX_B: usize = 128;

    pub fn kind(&self) -> CommandKind {
        CommandKind::from(self)
    }

    pub fn token(&self) -> &'static str {
        self.kind().token()
    }

    /// Announce-only commands are acted upon from the control channel alone.
    pub fn has_exchange(&self) -> bool {
        !matches!(self, Command::WatchDogStart | Command::WatchDogClose)
    }

    pub fn reply_shape(&self) -> ReplyShape {
        match self {
            Command::InitIo => ReplyShape::Exact(1),
            Command::Version => ReplyShape::UpTo(Self::VERSION_MAX_B),

            Command::FanCount
            | Command::CpuFanRpm
            | Command::GpuFanRpm
            | Command::Gpu1FanRpm
            | Command::X72FanRpm
            | Command::WatchDogStatus => ReplyShape::Exact(4),

            Command::TempFanDuty(_) => ReplyShape::Exact(EcSample::SIZE_B),

            Command::SetFanDuty { .. }
            | Command::SetFanAuto(_)
            | Command::WatchDogStart
            | Command::WatchDogClose => ReplyShape::None,
        }
    }
}

impl Encode for Command {
    fn encode<B: BufMut>(&self, buf: &mut B) {
        match self {
            Command::TempFanDuty(fan) | Command::SetFanAuto(fan) => fan.encode(buf),

            Command::SetFanDuty { fan, duty } => {
                fan.encode(buf);
                buf.put_u32_le(*duty);
            }

            _ => {}
        }
    }
}

impl CommandKind {
    pub fn token(self) -> &'static str {
        self.into()
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/* == Reply == */

/// Decoded reply of any command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reply {
    None,
    Flag(bool),
    Count(i32),
    Text(String),
    Sample(EcSample),
}

impl Reply {
    pub fn decode<B: Buf>(command: &Command, buf: &mut B) -> Result<Reply, DecodeError> {
        let reply = match command {
            Command::InitIo => Reply::Flag(buf.try_get_bool()?),
            Command::WatchDogStatus => Reply::Flag(buf.try_get_slot_bool()?),
            Command::Version => Reply::Text(buf.get_text(Command::VERSION_MAX_B)),

            Command::FanCount
            | Command::CpuFanRpm
            | Command::GpuFanRpm
            | Command::Gpu1FanRpm
            | Command::X72FanRpm => Reply::Count(buf.try_get_i32_le()?),

            Command::TempFanDuty(_) => Reply::Sample(EcSample::decode(buf)?),

            Command::SetFanDuty { .. }
            | Command::SetFanAuto(_)
            | Command::WatchDogStart
            | Command::WatchDogClose => Reply::None,
        };

        Ok(reply)
    }
}

/* == Telemetry == */

/// Converts a raw RPM divisor reading. Zero and negative divisors are "no reading".
pub fn rpm_from_divisor(divisor: i32) -> Option<u32> {
    const RPM_NUMERATOR: u32 = 2_100_000;

    u32::try_from(divisor)
        .ok()
        .filter(|&d| d > 0)
        .map(|d| RPM_NUMERATOR / d)
}

/// Raw RPM divisors of the fixed fan channels.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FanRpms {
    pub cpu: i32,
    pub gpu: i32,
    pub gpu1: i32,
    pub x72: i32,
}

/// A full read of the service's telemetry.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Telemetry {
    pub fan_count: i32,
    pub rpm_divisors: FanRpms,
    pub samples: Vec<(FanId, EcSample)>,
}
