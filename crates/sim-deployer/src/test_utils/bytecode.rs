use alloy_primitives::Bytes;
use revm::bytecode::opcode::{CODECOPY, MSTORE, PUSH0, RETURN, REVERT};

/// A builder for assembling EVM bytecode.
#[derive(Debug, Default)]
pub struct BytecodeBuilder {
    code: Vec<u8>,
}

impl BytecodeBuilder {
    /// Build the bytecode.
    pub fn build(self) -> Bytes {
        self.code.into()
    }

    /// Get the length of the bytecode.
    pub fn len(&self) -> usize {
        self.code.len()
    }

    /// Check if the bytecode is empty.
    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    /// Append a single opcode or byte.
    pub fn append(mut self, opcode: u8) -> Self {
        self.code.push(opcode);
        self
    }

    /// Append a series of opcodes or bytes.
    pub fn append_many(mut self, items: impl IntoIterator<Item = u8>) -> Self {
        self.code.extend(items);
        self
    }

    /// Append a PUSH opcode and the bytes to push.
    pub fn push_bytes(mut self, bytes: impl AsRef<[u8]>) -> Self {
        let bytes = bytes.as_ref();
        assert!(bytes.len() <= 32);
        self.code.push(PUSH0 + bytes.len() as u8);
        self.code.extend_from_slice(bytes);
        self
    }

    /// Append the shortest non-zero-width PUSH of `value`. Zero is pushed with `PUSH1 0x00`.
    pub fn push_number(self, value: usize) -> Self {
        let bytes = value.to_be_bytes();
        let first = bytes.iter().position(|byte| *byte != 0).unwrap_or(bytes.len() - 1);
        self.push_bytes(&bytes[first..])
    }

    /// Store a 32-byte word holding `value` at memory `offset`.
    pub fn mstore_number(self, offset: usize, value: usize) -> Self {
        self.push_number(value).push_number(offset).append(MSTORE)
    }

    /// Append a REVERT opcode with empty return data.
    pub fn revert(self) -> Self {
        self.append_many([PUSH0, PUSH0, REVERT])
    }

    /// Append a RETURN of `len` bytes of memory starting at `offset`.
    pub fn return_memory(self, offset: usize, len: usize) -> Self {
        self.push_number(len).push_number(offset).append(RETURN)
    }

    /// Append code that copies `len` bytes of the running code at `code_offset` to memory and
    /// returns them.
    fn copy_code_and_return(self, code_offset: usize, len: usize) -> Self {
        self.push_number(len)
            .push_number(code_offset)
            .push_number(0)
            .append(CODECOPY)
            .return_memory(0, len)
    }
}

/// Wraps runtime code into init code that deploys it unchanged.
///
/// Anything appended after the returned init code (constructor arguments) is ignored.
pub fn init_code_for(runtime: impl AsRef<[u8]>) -> Bytes {
    let runtime = runtime.as_ref();
    // The header offset fits in one byte, so its PUSH width does not depend on its value.
    let header_len = BytecodeBuilder::default().copy_code_and_return(0, runtime.len()).len();
    BytecodeBuilder::default()
        .copy_code_and_return(header_len, runtime.len())
        .append_many(runtime.iter().copied())
        .build()
}
