// Engine Error Handling
//
// Every error here is fatal for the running game: content errors mean the
// data files are corrupt or unsupported, exhaustion errors mean a fixed-size
// table overflowed. Soft conditions (missing subroutine, missing sound bank)
// are reported through Option/bool instead and never reach this type.

use std::fmt;

/// Which of the two bytecode machines raised an opcode error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VmKind {
    Script,
    Vga,
}

impl fmt::Display for VmKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            VmKind::Script => write!(f, "script"),
            VmKind::Vga => write!(f, "VGA"),
        }
    }
}

#[derive(Debug)]
pub enum EngineError {
    // Content errors
    InvalidOpcode(VmKind, u16),
    UnregisteredOpcode(VmKind, u16),
    RecursionLimit(usize),
    DivisionByZero,
    BadItem(u16),
    ItemCycle(u16, u16), // item, requested parent
    UnlinkInconsistent(u16),
    BadVariable(usize),
    CodeOverrun(usize),
    BadResource(String),
    MissingResource(String),
    ZoneNotFound(u16),
    Decrunch(String),

    // Resource exhaustion
    HeapOverflow {
        heap: &'static str,
        used: usize,
        capacity: usize,
    },
    TableFull(&'static str),

    // Environment
    Io(std::io::Error),
    Config(String),
    Display(String),
    SaveFormat(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EngineError::InvalidOpcode(vm, opcode) => {
                write!(f, "Invalid {} opcode '{}' encountered", vm, opcode)
            }
            EngineError::UnregisteredOpcode(vm, opcode) => {
                write!(f, "Unregistered {} opcode '{}' encountered", vm, opcode)
            }
            EngineError::RecursionLimit(depth) => {
                write!(f, "Recursion error: subroutine nesting exceeded {}", depth)
            }
            EngineError::DivisionByZero => write!(f, "Division by zero in arithmetic opcode"),
            EngineError::BadItem(id) => write!(f, "Reference to invalid item {}", id),
            EngineError::ItemCycle(item, parent) => {
                write!(
                    f,
                    "Setting parent of item {} to {} would create a cycle",
                    item, parent
                )
            }
            EngineError::UnlinkInconsistent(id) => {
                write!(f, "unlinkItem: parent does not contain child {}", id)
            }
            EngineError::BadVariable(index) => {
                write!(f, "Variable {} out of range", index)
            }
            EngineError::CodeOverrun(pos) => {
                write!(f, "Bytecode read past end of code at offset {}", pos)
            }
            EngineError::BadResource(msg) => write!(f, "Malformed resource: {}", msg),
            EngineError::MissingResource(name) => write!(f, "Resource not found: {}", name),
            EngineError::ZoneNotFound(zone) => write!(f, "VGA zone {} could not be loaded", zone),
            EngineError::Decrunch(msg) => write!(f, "Decrunch failed: {}", msg),
            EngineError::HeapOverflow {
                heap,
                used,
                capacity,
            } => {
                write!(
                    f,
                    "{} overflow: {} bytes needed, capacity {}",
                    heap, used, capacity
                )
            }
            EngineError::TableFull(table) => write!(f, "{} is full", table),
            EngineError::Io(e) => write!(f, "I/O error: {}", e),
            EngineError::Config(msg) => write!(f, "Configuration error: {}", msg),
            EngineError::Display(msg) => write!(f, "Display error: {}", msg),
            EngineError::SaveFormat(msg) => write!(f, "Save game error: {}", msg),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for EngineError {
    fn from(e: std::io::Error) -> Self {
        EngineError::Io(e)
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_machine() {
        let e = EngineError::InvalidOpcode(VmKind::Vga, 201);
        assert_eq!(e.to_string(), "Invalid VGA opcode '201' encountered");
        let e = EngineError::UnregisteredOpcode(VmKind::Script, 4);
        assert!(e.to_string().contains("script"));
    }

    #[test]
    fn test_io_errors_keep_source() {
        use std::error::Error;
        let e: EngineError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(e.source().is_some());
    }
}
