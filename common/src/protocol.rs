//! Protocol definition for the data socket.
//!
use serde::{Deserialize, Serialize};

/// Definition of protocol messages.
#[derive(Debug, Deserialize, PartialEq, Serialize)]
pub enum ProtoMsg {
    /// First message of every connection, names the channel to publish labels on.
    ConnectReq(String),
    LandmarkMsg(LandmarkMsg),
    /// Restart the translation session of this connection.
    Reset,
}

/// One detected hand keypoint in normalized image coordinates.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Landmarks of one camera frame.
///
/// `landmarks` is `None` when the detector found no hand in the frame.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct LandmarkMsg {
    pub id: String,
    pub landmarks: Option<Vec<Landmark>>,
}

impl LandmarkMsg {
    pub fn new(id: String, landmarks: Option<Vec<Landmark>>) -> Self {
        Self { id, landmarks }
    }
}

impl ProtoMsg {
    pub fn serialize(&self) -> Result<Vec<u8>, Box<bincode::ErrorKind>> {
        bincode::serialize(self)
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Self, Box<bincode::ErrorKind>> {
        bincode::deserialize(bytes)
    }
}

#[cfg(test)]
mod test {

    use super::*;
    use crate::Error;

    #[test]
    fn test_bincode_serde() -> Result<(), Error> {
        let landmark_msg = LandmarkMsg {
            id: "bla".into(),
            landmarks: Some(vec![Landmark::new(0.1, 0.2, -0.3); 21]),
        };

        let serialized: Vec<u8> = bincode::serialize(&landmark_msg)?;
        let deserialized_msg: LandmarkMsg = bincode::deserialize(&serialized[..])?;

        assert_eq!(landmark_msg, deserialized_msg);

        Ok(())
    }

    #[test]
    fn test_frame_without_hand() -> Result<(), Error> {
        let msg = ProtoMsg::LandmarkMsg(LandmarkMsg::new("bla".into(), None));
        let bytes = msg.serialize()?;

        assert_eq!(ProtoMsg::deserialize(&bytes)?, msg);

        Ok(())
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(ProtoMsg::deserialize(&[0xff, 0xff, 0xff, 0xff, 0x01]).is_err());
    }
}
