pub mod cursor;
pub mod document;
pub mod query;
pub mod visibility;

pub use cursor::{Cursor, CursorError};
pub use document::{
	KeyValue, LangString, Media, MultiLangText, Note, Person, Reference, SourceDocument,
};
pub use query::{CombineMode, FacetRequest, FilterTerm, SortField, SortOrder, TermSpec};
pub use visibility::{CONTENT_SCOPE, META_SCOPE, Visibility, effective_groups};
