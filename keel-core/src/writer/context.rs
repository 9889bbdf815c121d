#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fragment {
    #[default]
    None,
    SqlCreateTable,
    SqlDropTable,
    SqlInsertInto,
    SqlInsertIntoValues,
    SqlInsertIntoOnConflict,
    SqlUpdateSet,
    SqlSelect,
    SqlDeleteFrom,
    SqlWhere,
    SqlOrderBy,
    SqlLimit,
}

/// State threaded through a writer while one statement is rendered.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Context {
    /// Placeholders written so far.
    pub counter: u32,
    pub fragment: Fragment,
}

impl Context {
    pub fn new(fragment: Fragment) -> Self {
        Self {
            counter: 0,
            fragment,
        }
    }

    pub fn update_from(&mut self, context: &Context) {
        self.counter = context.counter;
    }

    pub fn switch_fragment<'s>(&'s mut self, fragment: Fragment) -> ContextUpdater<'s> {
        ContextUpdater {
            current: Context { fragment, ..*self },
            previous: self,
        }
    }
}

/// Child context, the placeholder counter flows back into the parent when dropped.
pub struct ContextUpdater<'a> {
    pub current: Context,
    pub previous: &'a mut Context,
}

impl<'a> Drop for ContextUpdater<'a> {
    fn drop(&mut self) {
        self.previous.update_from(&self.current);
    }
}
