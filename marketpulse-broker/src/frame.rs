use crate::error::BrokerError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Frames larger than this are rejected outright rather than allocating unboundedly for a
/// corrupt or hostile length prefix.
const MAX_FRAME_BYTES: u32 = 16 * 1024 * 1024;

/// Encode `value` as MessagePack and write it to `writer` as a `u32` big-endian length prefix
/// followed by the payload (§4.C "Framing").
pub async fn write_frame<W, T>(writer: &mut W, value: &T) -> Result<(), BrokerError>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let payload = rmp_serde::to_vec(value)?;
    let len: u32 = payload
        .len()
        .try_into()
        .map_err(|_| BrokerError::FrameTooLarge {
            max: MAX_FRAME_BYTES,
            got: u32::MAX,
        })?;
    if len > MAX_FRAME_BYTES {
        return Err(BrokerError::FrameTooLarge {
            max: MAX_FRAME_BYTES,
            got: len,
        });
    }
    writer.write_all(&len.to_be_bytes()).await?;
    writer.write_all(&payload).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one length-prefixed MessagePack frame from `reader` and decode it as `T`.
///
/// Returns `Ok(None)` on a clean EOF between frames (the peer closed the connection).
pub async fn read_frame<R, T>(reader: &mut R) -> Result<Option<T>, BrokerError>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(error) if error.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(error) => return Err(error.into()),
    }
    let len = u32::from_be_bytes(len_buf);
    if len > MAX_FRAME_BYTES {
        return Err(BrokerError::FrameTooLarge {
            max: MAX_FRAME_BYTES,
            got: len,
        });
    }

    let mut payload = vec![0u8; len as usize];
    reader.read_exact(&mut payload).await?;
    Ok(Some(rmp_serde::from_slice(&payload)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Sample {
        a: u32,
        b: String,
    }

    #[tokio::test]
    async fn test_write_then_read_frame_round_trips() {
        let mut buffer = Vec::new();
        let value = Sample {
            a: 7,
            b: "hello".into(),
        };
        write_frame(&mut buffer, &value).await.unwrap();

        let mut cursor = std::io::Cursor::new(buffer);
        let decoded: Sample = read_frame(&mut cursor).await.unwrap().unwrap();
        assert_eq!(decoded, value);
    }

    #[tokio::test]
    async fn test_read_frame_returns_none_on_clean_eof() {
        let mut cursor = std::io::Cursor::new(Vec::<u8>::new());
        let decoded: Option<Sample> = read_frame(&mut cursor).await.unwrap();
        assert!(decoded.is_none());
    }

    #[tokio::test]
    async fn test_read_frame_rejects_oversized_length_prefix() {
        let mut buffer = Vec::new();
        buffer.extend_from_slice(&(MAX_FRAME_BYTES + 1).to_be_bytes());
        let mut cursor = std::io::Cursor::new(buffer);
        let result: Result<Option<Sample>, _> = read_frame(&mut cursor).await;
        assert!(matches!(result, Err(BrokerError::FrameTooLarge { .. })));
    }
}
