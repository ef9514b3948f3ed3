/*!

This is the long-form manual for `survey_qc` and `intstats`.

## Input table

One row per respondent. The following columns are required (names can be
changed in the configuration):

* `ID` the respondent identifier
* `StartTime_TS` and `EndTime_TS` the start and end of the interview

Each interviewer role has a pair of columns, `<prefix>IntID_W4` for the
interviewer id and `<prefix>IntName_W4` for the interviewer name. The default
prefixes are `F`, `M`, `HH`, `ORGHH` and `C`. A column is an interviewer column
as soon as it starts with one of the prefixes and ends with one of the two
suffixes.

Every other column is a question, except the names of the derived fields
(`Start_dt`, `End_dt`, `duration_minutes`, `duration_display`).

|  ID | StartTime_TS         | EndTime_TS           | FIntID_W4 | FIntName_W4 | Q1  | Q2 |
|-----|----------------------|----------------------|-----------|-------------|-----|----|
|  17 | 2024-01-01T10:00:00Z | 2024-01-01T10:29:45Z | 5         | Ama         | 197 | 2  |

### Timestamps

Accepted layouts are RFC 3339 (`2024-01-01T10:00:00Z`,
`2024-01-01T12:00:00+02:00`), `YYYY-MM-DD HH:MM[:SS[.fff]]` with or without an
offset, `MM/DD/YYYY HH:MM[:SS]` and plain dates. Timestamps without an offset
are read as UTC. Spreadsheet date cells are converted by the reader.

The duration is the elapsed time in whole minutes, truncated toward zero:
10:00:00 to 10:29:45 is 29 minutes. End before start gives a negative
duration, which is kept unless `negativeDurations` is set to `drop`.

### Special response codes

A question cell counts as Don't-Know when its text ends with `97`, as Refuse
when it ends with `99` and as Not-Applicable when it ends with `98`. This is a
suffix match: `197` and `1997` are Don't-Know too. Blank cells are not
answered and never classified. Numbers are compared in their integer form when
they have no fractional part.

## Policies for incomplete data

The pipeline never fails on a bad cell. It leaves things out and says so:

* Rows whose start or end time cannot be read are dropped from every table.
  The count is logged and each row is listed in the diagnostics.
* A role with a name column but no id column with the same prefix (or the
  other way around) is skipped, with a warning.
* An interview whose interviewer id is blank is not counted for anyone by
  default (`missingIdPolicy: "drop"`). With `missingIdPolicy: "bucket"` it is
  counted under `unknownIdLabel` (default `unknown`), on a line of its own
  even when a real interviewer has that id.
* With `negativeDurations: "drop"`, rows that end before they start are
  dropped and counted apart from the rows with unreadable times.

Missing columns `ID`, `StartTime_TS` or `EndTime_TS` are fatal errors.

## Interviewer statistics

One line per interviewer id. Ids are compared as text (`05` and `5` are two
interviewers) and sorted by their numeric value; ids that are not numbers come
last, in the order in which they first appear.

| column                 | content                                                 |
|------------------------|---------------------------------------------------------|
| `IntID`                | the interviewer id                                      |
| `IntName`              | the first name recorded for this id                     |
| `total_interviews`     | number of (respondent, role) interviews                 |
| `min_duration_display` | shortest duration, `12 min`                             |
| `avg_duration_display` | mean duration to 2 decimals (halves to even), `12.5 min`|
| `max_duration_display` | longest duration                                        |
| `avg_questions`        | mean number of answered questions, rounded (half up)    |
| `total_DK`             | sum of Don't-Know codes                                 |
| `total_RF`             | sum of Refuse codes                                     |
| `total_NA`             | sum of Not-Applicable codes                             |

A respondent interviewed under two roles counts once for each role.

*/
