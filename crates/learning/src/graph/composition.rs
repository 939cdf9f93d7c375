//! Composite operations that keep both ends of a relationship in agreement.
//!
//! A course lists its modules in order and each module points back at its
//! course. Neither side is writable on its own outside this crate: attaching
//! and detaching always update both in one step, and renumber the module
//! positions of the course.

use crate::{CourseId, ModuleId, StoreError, TagId};

use super::EntityGraph;

impl EntityGraph {
    /// Attaches a detached module to the end of the course's module sequence
    /// and points the module at the course.
    pub fn add_module(
        &mut self,
        course_id: CourseId,
        module_id: ModuleId,
    ) -> Result<(), StoreError> {
        self.course(course_id)?;
        match self.module(module_id)?.course {
            None => {}
            Some(current) if current == course_id => {
                return Err(StoreError::integrity(format!(
                    "module {module_id} is already attached to course {course_id}"
                )));
            }
            Some(other) => {
                return Err(StoreError::integrity(format!(
                    "module {module_id} belongs to course {other}"
                )));
            }
        }

        if let Some(course) = self.tables.courses.get_mut(&course_id) {
            course.modules.push(module_id);
        }
        if let Some(module) = self.tables.modules.get_mut(&module_id) {
            module.course = Some(course_id);
        }
        self.renumber_modules(course_id);
        Ok(())
    }

    /// Detaches a module from the course: removes it from the course's module
    /// sequence and clears the module's course reference. The module itself
    /// and its lessons are kept.
    pub fn remove_module(
        &mut self,
        course_id: CourseId,
        module_id: ModuleId,
    ) -> Result<(), StoreError> {
        self.course(course_id)?;
        if self.module(module_id)?.course != Some(course_id) {
            return Err(StoreError::integrity(format!(
                "module {module_id} is not attached to course {course_id}"
            )));
        }

        if let Some(course) = self.tables.courses.get_mut(&course_id) {
            course.modules.retain(|m| *m != module_id);
        }
        if let Some(module) = self.tables.modules.get_mut(&module_id) {
            module.course = None;
            module.position = 0;
        }
        self.renumber_modules(course_id);
        Ok(())
    }

    fn renumber_modules(&mut self, course_id: CourseId) {
        let Some(course) = self.tables.courses.get(&course_id) else {
            return;
        };
        for (index, module_id) in course.modules.iter().enumerate() {
            if let Some(module) = self.tables.modules.get_mut(module_id) {
                module.position = index as u32 + 1;
            }
        }
    }

    /// Links a tag to a course. Linking an already-linked tag is a no-op.
    pub fn tag_course(&mut self, course_id: CourseId, tag_id: TagId) -> Result<(), StoreError> {
        self.tag(tag_id)?;
        let course = self
            .tables
            .courses
            .get_mut(&course_id)
            .ok_or_else(|| StoreError::row_not_found("course", course_id))?;
        course.tags.insert(tag_id);
        Ok(())
    }

    /// Unlinks a tag from a course. Returns whether a link existed.
    pub fn untag_course(&mut self, course_id: CourseId, tag_id: TagId) -> Result<bool, StoreError> {
        self.tag(tag_id)?;
        let course = self
            .tables
            .courses
            .get_mut(&course_id)
            .ok_or_else(|| StoreError::row_not_found("course", course_id))?;
        Ok(course.tags.remove(&tag_id))
    }
}
