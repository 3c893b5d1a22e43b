//! Byte-stream decoding.
//!
//! The HTML core accepts a UTF-8 byte stream; bytes above ASCII that form
//! invalid UTF-8 are replaced with U+FFFD, matching `tools::utf8`'s existing
//! chunked-decode contract used elsewhere in this workspace. This is a plain
//! one-shot decode: tokenization itself is a synchronous, non-streaming
//! operation, so there is no carry-over state to keep between calls.
pub fn decode_bytes(bytes: &[u8]) -> String {
    let mut text = String::with_capacity(bytes.len());
    let mut carry = Vec::new();
    tools::utf8::push_utf8_chunk(&mut text, &mut carry, bytes);
    tools::utf8::finish_utf8(&mut text, &mut carry);
    text
}
