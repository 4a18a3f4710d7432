use std::cell::RefCell;

thread_local! {
    static REQUEST_INFO: RefCell<Option<String>> = const { RefCell::new(None) };
}

///
/// Returns the correlation tag of the internal request currently being
/// dispatched on this thread, if any.
///
/// The tag carries the essential request information (method, path,
/// selectors, extension, resource type and super type) and is installed for
/// the duration of `InternalRequest::execute`. It is meant to be picked up
/// by log formatters or handlers when several internal requests run in the
/// context of a single outer request.
///
pub fn current_request_info() -> Option<String> {
    REQUEST_INFO.with(|slot| slot.borrow().clone())
}

/// Restores the previous tag when dropped, so the slot is released on
/// every exit path out of the dispatch, panics included.
pub(crate) struct ContextGuard {
    previous: Option<String>,
}

pub(crate) fn enter(info: String) -> ContextGuard {
    let previous = REQUEST_INFO.with(|slot| slot.borrow_mut().replace(info));
    ContextGuard { previous }
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        REQUEST_INFO.with(|slot| *slot.borrow_mut() = previous);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_is_scoped_to_the_guard() {
        assert_eq!(current_request_info(), None);
        {
            let _guard = enter("GET P=/outer".to_string());
            assert_eq!(current_request_info().as_deref(), Some("GET P=/outer"));
            {
                let _nested = enter("GET P=/inner".to_string());
                assert_eq!(current_request_info().as_deref(), Some("GET P=/inner"));
            }
            assert_eq!(current_request_info().as_deref(), Some("GET P=/outer"));
        }
        assert_eq!(current_request_info(), None);
    }

    #[test]
    fn tag_is_released_on_panic() {
        let result = std::panic::catch_unwind(|| {
            let _guard = enter("GET P=/panicking".to_string());
            panic!("boom");
        });
        assert!(result.is_err());
        assert_eq!(current_request_info(), None);
    }
}
