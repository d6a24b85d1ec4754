/// Reads a response body to the end in fixed-size chunks.
///
/// The whole body is kept so a marker that straddles two chunks, or sits past
/// any chunk count, is still visible to [`crate::DesiredState::evaluate`].
pub fn collect_body<E, F>(mut read: F) -> Result<String, E>
where
    F: FnMut(&mut [u8]) -> Result<usize, E>,
{
    let mut body = Vec::new();
    let mut chunk = [0_u8; BODY_CHUNK_SIZE];

    loop {
        let read = read(&mut chunk)?;
        if read == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..read]);
    }

    Ok(String::from_utf8_lossy(&body).into_owned())
}

pub const BODY_CHUNK_SIZE: usize = 512;
