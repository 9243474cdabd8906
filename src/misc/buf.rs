use bytes::{Buf, BufMut, TryGetError};
use thiserror::Error;

/* == Encode/decode traits == */
pub trait Encode {
    fn encode<B: BufMut>(&self, buf: &mut B);
}

pub trait Decode: Sized {
    fn decode<B: Buf>(buf: &mut B) -> Result<Self, DecodeError>;
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("not enough bytes available ({available} of {requested})")]
    UnexpectedEndOfStream { available: usize, requested: usize },
}

impl From<TryGetError> for DecodeError {
    fn from(err: TryGetError) -> Self {
        DecodeError::UnexpectedEndOfStream {
            available: err.available,
            requested: err.requested,
        }
    }
}

/* == Trait extensions == */

pub trait BufExt: Buf {
    /// Width of an integer slot as written by the service.
    const SLOT_B: usize = 4;

    fn ensure_capacity(&mut self, requested: usize) -> Result<(), TryGetError> {
        match self.remaining() {
            n if n >= requested => Ok(()),
            available => Err(TryGetError {
                available,
                requested,
            }),
        }
    }

    fn try_get_bool(&mut self) -> Result<bool, TryGetError> {
        Ok(self.try_get_u8()? != 0)
    }

    /// Reads a 4-byte slot of which only the leading byte is significant.
    fn try_get_slot_u8(&mut self) -> Result<u8, TryGetError> {
        self.ensure_capacity(Self::SLOT_B)?;
        let value = self.get_u8();
        self.advance(Self::SLOT_B - 1);
        Ok(value)
    }

    /// Booleans sent as a full 32-bit slot, non-zero leading byte is true.
    fn try_get_slot_bool(&mut self) -> Result<bool, TryGetError> {
        Ok(self.try_get_slot_u8()? != 0)
    }

    /// Consumes at most `max` bytes as UTF-8 text, replacing invalid sequences.
    fn get_text(&mut self, max: usize) -> String {
        let len = self.remaining().min(max);
        let bytes = self.copy_to_bytes(len);

        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl<T: Buf> BufExt for T {}

pub trait BufMutExt: BufMut {
    /// Command tokens are written verbatim, the channel close ends the message.
    fn put_token(&mut self, token: &str) {
        self.put_slice(token.as_bytes());
    }
}

impl<T: BufMut> BufMutExt for T {}
