#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod docx;
mod mock;

pub use docx::{CONTENT_TYPES_XML, DocxBuilder, RELS_XML, document_xml};
pub use mock::{
    ChannelSender, ChannelSource, CloseLog, MemoryCache, MemoryPartition, MockObject,
    MockObjectProvider, RecordingPublisher, memory_storage,
};
