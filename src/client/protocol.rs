use std::io::{Read, Write};

use crate::{
    error::{Error, Result},
    link::{Connector, Wait},
    misc::buf::{BufMutExt, Encode},
};

use super::defs::*;

/* == Phase A: announce == */

/// Names the next per-command channel on the shared control channel.
///
/// The token is written verbatim; closing the connection ends the message.
pub fn announce<C: Connector>(connector: &C, control: &str, token: &str, wait: Wait) -> Result<()> {
    let mut stream = connector
        .connect(control, wait)
        .map_err(|err| Error::unavailable(control, err))?;

    tracing::debug!("Announcing {token} on {control}");

    let mut buf = Vec::with_capacity(token.len());
    buf.put_token(token);

    stream
        .write_all(&buf)
        .and_then(|_| stream.flush())
        .map_err(|err| Error::transfer(control, err))
}

/* == Phase B: exchange == */

/// Sends the request payload on the command's own channel and collects the
/// raw reply, never reading past the declared reply length.
pub fn exchange<C: Connector>(connector: &C, command: &Command) -> Result<Vec<u8>> {
    let channel = command.token();

    let mut stream = connector
        .connect(channel, Wait::Blocking)
        .map_err(|err| Error::unavailable(channel, err))?;

    let mut request = Vec::new();
    command.encode(&mut request);

    if !request.is_empty() {
        tracing::trace!("Sending {} request bytes on {channel}", request.len());

        stream
            .write_all(&request)
            .and_then(|_| stream.flush())
            .map_err(|err| Error::transfer(channel, err))?;
    }

    let reply = match command.reply_shape() {
        ReplyShape::None => Vec::new(),
        ReplyShape::UpTo(max) => read_reply(&mut stream, channel, max)?,

        ReplyShape::Exact(expected) => {
            let reply = read_reply(&mut stream, channel, expected)?;

            if reply.len() < expected {
                return Err(Error::ShortRead {
                    command: channel,
                    expected,
                    received: reply.len(),
                });
            }

            reply
        }
    };

    tracing::trace!("Received {} reply bytes on {channel}", reply.len());

    Ok(reply)
}

/// Reads until `limit` bytes have arrived or the peer closes the channel.
fn read_reply<S: Read>(stream: &mut S, channel: &str, limit: usize) -> Result<Vec<u8>> {
    let mut reply = Vec::with_capacity(limit);

    stream
        .take(limit as u64)
        .read_to_end(&mut reply)
        .map_err(|err| Error::transfer(channel, err))?;

    Ok(reply)
}
