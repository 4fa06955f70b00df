/// One AMI event as delivered by the event source.
///
/// The body is the manager text block, `Field: Value` lines separated by
/// `\r\n`. The pipeline only borrows it for the duration of one call.
#[derive(Debug, Clone, Copy)]
pub struct RawEvent<'a> {
    pub category: u32,
    pub name: &'a str,
    pub body: &'a str,
}

impl<'a> RawEvent<'a> {
    pub fn new(name: &'a str, body: &'a str) -> Self {
        Self {
            category: 0,
            name,
            body,
        }
    }

    pub fn with_category(mut self, category: u32) -> Self {
        self.category = category;
        self
    }

    /// Value of the first `Event: ` line in the body, if any.
    pub fn name_from_body(body: &str) -> Option<&str> {
        body.split(['\r', '\n'])
            .find_map(|line| line.strip_prefix("Event: "))
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}
