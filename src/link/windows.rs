use std::{
    fs::{File, OpenOptions},
    io,
    path::Path,
    thread,
    time::Duration,
};

use super::Wait;

pub type LocalStream = File;

const ERROR_PIPE_BUSY: i32 = 231;
const BUSY_RETRY: Duration = Duration::from_millis(5);

pub fn connect(path: &Path, wait: Wait) -> io::Result<File> {
    loop {
        match OpenOptions::new().read(true).write(true).open(path) {
            // All pipe instances are in use, the server will free one shortly
            Err(err) if err.raw_os_error() == Some(ERROR_PIPE_BUSY) && wait == Wait::Blocking => {
                thread::sleep(BUSY_RETRY);
            }

            result => return result,
        }
    }
}
