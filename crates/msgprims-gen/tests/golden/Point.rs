// Generated by msgprims from geometry_msgs/Point. Do not edit.

use msgprims_codec::bytes::BytesMut;
use msgprims_codec::wire::{WireReader, WireWriter};
use msgprims_codec::CodecError;

/// `geometry_msgs/Point` message.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Default for Point {
    fn default() -> Self {
        Self {
            x: Default::default(),
            y: Default::default(),
            z: Default::default(),
        }
    }
}

impl Point {
    pub const TYPE_NAME: &str = "geometry_msgs/Point";
    pub const FINGERPRINT: &str = "4a842b65f413084dc2b10fb484ea7f17";
    pub const DEFINITION: &str = "float64 x\nfloat64 y\nfloat64 z\n";

    /// Append the encoded message to `dst`; `dst` is unchanged on error.
    pub fn encode(&self, dst: &mut BytesMut) -> Result<(), CodecError> {
        let start = dst.len();
        let result = self.write(&mut WireWriter::new(dst));
        if result.is_err() {
            dst.truncate(start);
        }
        result
    }

    pub fn write(&self, writer: &mut WireWriter<'_>) -> Result<(), CodecError> {
        writer.put_f64(self.x);
        writer.put_f64(self.y);
        writer.put_f64(self.z);
        Ok(())
    }

    pub fn decode(reader: &mut WireReader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            x: reader.read_f64("x")?,
            y: reader.read_f64("y")?,
            z: reader.read_f64("z")?,
        })
    }
}
