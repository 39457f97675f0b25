/// Splits `data` into GIF sub-blocks: each prefixed by a length byte
/// (1..=255), terminated by a single zero-length block.
///
/// An empty `data` still produces the zero terminator.
pub fn frame_sub_blocks(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + data.len() / 255 + 2);
    for chunk in data.chunks(255) {
        out.push(chunk.len() as u8);
        out.extend_from_slice(chunk);
    }
    out.push(0);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_emits_only_terminator() {
        assert_eq!(frame_sub_blocks(&[]), vec![0]);
    }

    #[test]
    fn short_input_is_one_block() {
        let data = [1, 2, 3];
        assert_eq!(frame_sub_blocks(&data), vec![3, 1, 2, 3, 0]);
    }

    #[test]
    fn exact_255_bytes_is_one_block_plus_terminator() {
        let data = vec![7u8; 255];
        let out = frame_sub_blocks(&data);
        assert_eq!(out[0], 255);
        assert_eq!(out.len(), 1 + 255 + 1);
        assert_eq!(*out.last().unwrap(), 0);
    }

    #[test]
    fn spills_past_255_bytes_into_two_blocks() {
        let data = vec![9u8; 256];
        let out = frame_sub_blocks(&data);
        assert_eq!(out[0], 255);
        assert_eq!(out[256], 1);
        assert_eq!(out[257], 9);
        assert_eq!(out[258], 0);
        assert_eq!(out.len(), 259);
    }
}
