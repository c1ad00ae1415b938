mod entry;
mod logger;
mod shutdown;

use loadrun::error::AppResult;

fn main() -> AppResult<()> {
    entry::run()
}
