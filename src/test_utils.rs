//! Shared helpers for unit tests: a scripted driver that records every
//! submission, and a byte sink for capturing rendered output.

use crate::driver::{Driver, RowSet};
use crate::error::{CheetahError, Result};
use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

/// Shared record of the SQL text handed to a scripted driver, in order.
#[derive(Debug, Clone, Default)]
pub struct SubmissionLog(Rc<RefCell<Vec<String>>>);

impl SubmissionLog {
    pub fn entries(&self) -> Vec<String> {
        self.0.borrow().clone()
    }
}

/// Driver stand-in that returns a fixed set of row-sets per submission,
/// or fails every submission.
pub struct ScriptedDriver {
    log: SubmissionLog,
    rowsets: Vec<RowSet>,
    fail: bool,
}

impl ScriptedDriver {
    pub fn new(log: SubmissionLog, rowsets: Vec<RowSet>) -> Self {
        ScriptedDriver {
            log,
            rowsets,
            fail: false,
        }
    }

    pub fn failing(log: SubmissionLog) -> Self {
        ScriptedDriver {
            log,
            rowsets: Vec::new(),
            fail: true,
        }
    }
}

impl Driver for ScriptedDriver {
    fn submit(&mut self, sql: &str) -> Result<Vec<RowSet>> {
        self.log.0.borrow_mut().push(sql.to_string());
        if self.fail {
            return Err(CheetahError::Execution("scripted failure".to_string()));
        }
        Ok(self.rowsets.clone())
    }
}

/// `Write` sink whose contents stay readable after being handed to an
/// executor.
#[derive(Debug, Clone, Default)]
pub struct SharedBuf(Rc<RefCell<Vec<u8>>>);

impl SharedBuf {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).to_string()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
