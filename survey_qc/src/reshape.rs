use log::debug;

use crate::config::*;
use crate::schema::ResolvedSchema;

/// Converts the wide records into the long form: one event per
/// (record, paired role), role by role, in the order of the roles.
///
/// Every record is emitted for every role, including the ones with no
/// interviewer id; the aggregator decides what to do with those. The result
/// holds `records.len() * schema.roles.len()` events.
pub fn reshape_long(
    table: &SurveyTable,
    schema: &ResolvedSchema,
    records: &[EnrichedRecord],
) -> Vec<InterviewEvent> {
    let mut events: Vec<InterviewEvent> = Vec::with_capacity(records.len() * schema.roles.len());
    for role in schema.roles.iter() {
        for rec in records.iter() {
            events.push(InterviewEvent {
                respondent_id: rec.respondent_id.clone(),
                role: role.prefix.clone(),
                interviewer_id: table.cell(rec.row, role.id_column.index).canonical(),
                interviewer_name: table.cell(rec.row, role.name_column.index).canonical(),
                duration_minutes: rec.duration_minutes,
                counts: rec.counts,
                questions_answered: rec.questions_answered,
            });
        }
        debug!(
            "reshape_long: role {:?} from {:?} / {:?}",
            role.prefix, role.id_column.name, role.name_column.name
        );
    }
    events
}
