/// Zero-filled receive buffer.
pub fn create_buffer(len: usize) -> Vec<u8> {
    vec![0u8; len]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_is_zeroed_at_requested_length() {
        let buf = create_buffer(16);
        assert_eq!(buf.len(), 16);
        assert!(buf.iter().all(|b| *b == 0));
    }
}
