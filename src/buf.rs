use std::io::Read;

// 64Kb digest/copy block
pub const BLOCK_SIZE: usize = 64 * 1024;

pub fn fill_buf<R: Read>(data: &mut R, buf: &mut [u8]) -> std::io::Result<(bool, usize)> {
    let mut buf_read = 0;

    while buf_read < buf.len() {
        match data.read(&mut buf[buf_read..]) {
            Ok(0) => return Ok((true, buf_read)),
            Ok(x) => buf_read += x,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => (),
            Err(e) => return Err(e),
        };
    }
    Ok((false, buf_read))
}

// Feed the reader block by block into `sink`, returns the total byte count
pub fn for_each_block<R, F>(reader: &mut R, mut sink: F) -> std::io::Result<u64>
where
    R: Read,
    F: FnMut(&[u8]),
{
    let mut total = 0;
    let mut in_buf = vec![0u8; BLOCK_SIZE];

    loop {
        match fill_buf(reader, &mut in_buf)? {
            (true, 0) => break,
            (eof, len) => {
                sink(&in_buf[..len]);
                total += len as u64;
                if eof {
                    break;
                }
            }
        }
    }
    Ok(total)
}
