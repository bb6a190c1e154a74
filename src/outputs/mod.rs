//! Persistence of scraped listings.
//!
//! # Submodules
//!
//! - [`sink`]: buffers one session's listings and flushes them to xlsx or CSV
//! - [`reader`]: finds, lists and reads datasets back from the data directory
//!
//! # Output Structure
//!
//! ```text
//! data_dir/
//! ├── Python开发_深圳_招聘数据.xlsx   # <keyword>_<cities>_招聘数据.<ext>
//! └── 前端_全国_招聘数据.csv          # no city filter => 全国
//! ```

pub mod reader;
pub mod sink;
