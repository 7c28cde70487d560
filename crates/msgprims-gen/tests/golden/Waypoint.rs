// Generated by msgprims from nav/Waypoint. Do not edit.

use msgprims_codec::bytes::BytesMut;
use msgprims_codec::wire::{WireReader, WireWriter};
use msgprims_codec::{CodecError, PathSegment, check_array_len};

/// `nav/Waypoint` message.
#[derive(Debug, Clone, PartialEq)]
pub struct Waypoint {
    pub name: String,
    pub position: crate::geometry_msgs::Point,
    pub headings: Vec<i16>,
    pub bounds: Vec<crate::geometry_msgs::Point>,
    pub active: bool,
}

impl Default for Waypoint {
    fn default() -> Self {
        Self {
            name: Default::default(),
            position: Default::default(),
            headings: Vec::new(),
            bounds: vec![Default::default(); 2],
            active: Default::default(),
        }
    }
}

impl Waypoint {
    pub const TYPE_NAME: &str = "nav/Waypoint";
    pub const FINGERPRINT: &str = "b8cb59baacf2446402dc9a2313bc6169";
    pub const DEFINITION: &str = "uint8 KIND=1\nstring name\ngeometry_msgs/Point position\nint16[] headings\ngeometry_msgs/Point[2] bounds\nbool active\n================================================================================\nMSG: geometry_msgs/Point\nfloat64 x\nfloat64 y\nfloat64 z\n";
    pub const KIND: u8 = 1;

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
        writer.put_string(&self.name, "name")?;
        self.position.write(writer).map_err(|err| {
            err.at(PathSegment::Field("position"))
        })?;
        writer.put_count(self.headings.len(), "headings")?;
        for item in &self.headings {
            writer.put_i16(*item);
        }
        check_array_len(2, self.bounds.len(), "bounds")?;
        for (index, item) in self.bounds.iter().enumerate() {
            item.write(writer).map_err(|err| {
                err.at(PathSegment::Index(index)).at(PathSegment::Field("bounds"))
            })?;
        }
        writer.put_bool(self.active);
        Ok(())
    }

    pub fn decode(reader: &mut WireReader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            name: reader.read_string("name")?,
            position: crate::geometry_msgs::Point::decode(reader).map_err(|err| err.at(PathSegment::Field("position")))?,
            headings: {
                let count = reader.read_count("headings", 2)?;
                let mut items = Vec::with_capacity(count.min(reader.remaining()));
                for index in 0..count {
                    items.push(reader.read_i16("").map_err(|err| err.at(PathSegment::Index(index)).at(PathSegment::Field("headings")))?);
                }
                items
            },
            bounds: {
                let count = 2;
                let mut items = Vec::with_capacity(count.min(reader.remaining()));
                for index in 0..count {
                    items.push(crate::geometry_msgs::Point::decode(reader).map_err(|err| err.at(PathSegment::Index(index)).at(PathSegment::Field("bounds")))?);
                }
                items
            },
            active: reader.read_bool("active")?,
        })
    }
}
