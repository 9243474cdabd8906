use std::{io, os::unix::net::UnixStream, path::Path, time::Duration};

use socket2::{Domain, SockAddr, Socket, Type};

use super::Wait;

pub type LocalStream = UnixStream;

/// A blocking connect only ever waits on a full listen backlog. An immediate
/// connect treats that case as a failure instead.
pub fn connect(path: &Path, wait: Wait, timeout: Option<Duration>) -> io::Result<UnixStream> {
    let stream = match wait {
        Wait::Blocking => UnixStream::connect(path)?,
        Wait::Immediate => connect_nonblocking(path)?,
    };

    if timeout.is_some() {
        stream.set_read_timeout(timeout)?;
        stream.set_write_timeout(timeout)?;
    }

    Ok(stream)
}

fn connect_nonblocking(path: &Path) -> io::Result<UnixStream> {
    let socket = Socket::new(Domain::UNIX, Type::STREAM, None)?;
    socket.set_nonblocking(true)?;

    // EAGAIN (backlog full) surfaces as `WouldBlock` and fails the attempt
    socket.connect(&SockAddr::unix(path)?)?;

    socket.set_nonblocking(false)?;
    Ok(UnixStream::from(std::os::fd::OwnedFd::from(socket)))
}
