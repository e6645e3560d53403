/// A name produced by a [`NameGenerator`]. Only the counter is stored; the
/// prefix is decided when the name is spelled out.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct GeneratedName(usize);

impl GeneratedName {
    pub fn to_string(&self, prefix: impl AsRef<str>) -> String {
        format!("{}{}", prefix.as_ref(), self.0)
    }
}

pub const TEMP_PREFIX: &str = "_tmp";

/// Produces unique temporary names. One generator is threaded through
/// everything that builds code for a program, so two builders never hand out
/// the same name unless they are given separate generators.
#[derive(Debug, Default)]
pub struct NameGenerator {
    curr_temp: usize,
}

impl NameGenerator {
    pub fn new() -> Self {
        Self { curr_temp: 0 }
    }

    pub fn fresh_temp(&mut self) -> GeneratedName {
        let id = GeneratedName(self.curr_temp);
        self.curr_temp += 1;
        id
    }

    pub fn temp(&mut self) -> String {
        self.fresh_temp().to_string(TEMP_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::NameGenerator;

    #[test]
    fn temps_count_up() {
        let mut names = NameGenerator::new();

        assert_eq!("_tmp0", names.temp());
        assert_eq!("_tmp1", names.temp());
        assert_eq!("_tmp2", names.temp());
    }

    #[test]
    fn separate_generators_start_over() {
        let mut first = NameGenerator::new();
        let mut second = NameGenerator::new();

        assert_eq!("_tmp0", first.temp());
        assert_eq!("_tmp0", second.temp());
    }
}
