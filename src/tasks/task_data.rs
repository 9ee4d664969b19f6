/* ************************************************************************ **
** This file is part of hgauss, and is licensed under EITHER the MIT        **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
**                                                                          **
** Be aware that not all of hgauss is provided under this permissive        **
** license, and that the project as a whole is licensed under the GPL 3.0.  **
** ************************************************************************ */

/// The buffers a task reads from and writes to, along with their declared sizes.
///
/// The caller owns every buffer; a task only borrows them.  The declared counts are what
/// the caller *claims* about the buffers, and a task's `validate` checks them against the
/// buffers it was actually given before touching any data.
///
/// What the counts mean is up to each task:
///
/// * For a linear system of dimension `n`, the inputs are the row-major matrix (`n * n`
///   elements) followed by the right-hand side (`n` elements), `inputs_count` is `[n]`,
///   and `outputs_count` is `[n * size_of::<f64>()]` (a size in bytes).
/// * For a sequence, there is one input, `inputs_count` is its length, and
///   `outputs_count` is `[1]` (an element count).
#[derive(Debug)]
pub struct TaskData<'a, I, O> {
    pub inputs: Vec<&'a [I]>,
    pub inputs_count: Vec<usize>,
    pub outputs: Vec<&'a mut [O]>,
    pub outputs_count: Vec<usize>,
}

pub type LinearSystemData<'a> = TaskData<'a, f64, f64>;
pub type SequenceData<'a> = TaskData<'a, i32, i32>;

impl<'a, I, O> TaskData<'a, I, O> {
    pub fn new() -> Self {
        TaskData {
            inputs: vec![],
            inputs_count: vec![],
            outputs: vec![],
            outputs_count: vec![],
        }
    }

    pub fn with_input(mut self, input: &'a [I]) -> Self
    { self.inputs.push(input); self }

    pub fn with_input_count(mut self, count: usize) -> Self
    { self.inputs_count.push(count); self }

    pub fn with_output(mut self, output: &'a mut [O], count: usize) -> Self
    { self.outputs.push(output); self.outputs_count.push(count); self }
}

impl<'a> LinearSystemData<'a> {
    /// Payload for a system of dimension `rhs.len()`, with all declared sizes filled in.
    pub fn linear_system(matrix: &'a [f64], rhs: &'a [f64], solution: &'a mut [f64]) -> Self {
        let n = rhs.len();
        TaskData::new()
            .with_input(matrix)
            .with_input(rhs)
            .with_input_count(n)
            .with_output(solution, n * ::std::mem::size_of::<f64>())
    }
}

impl<'a> SequenceData<'a> {
    pub fn sequence(input: &'a [i32], count: &'a mut [i32]) -> Self {
        TaskData::new()
            .with_input(input)
            .with_input_count(input.len())
            .with_output(count, 1)
    }
}

/// Reasons for a payload to fail validation.
#[derive(Debug, Fail, Clone, PartialEq, Eq)]
pub enum InvalidPayload {
    #[fail(display = "expected {} input buffer(s), got {}", expected, found)]
    InputBuffers { expected: usize, found: usize },

    #[fail(display = "expected {} output buffer(s), got {}", expected, found)]
    OutputBuffers { expected: usize, found: usize },

    #[fail(display = "no input count was declared")]
    MissingInputCount,

    #[fail(display = "no output size was declared")]
    MissingOutputCount,

    #[fail(display = "the system has dimension zero")]
    EmptySystem,

    #[fail(display = "input {} has {} elements, but {} were declared", index, found, expected)]
    InputLength { index: usize, expected: usize, found: usize },

    #[fail(display = "declared output size is {}, but {} is required", found, expected)]
    DeclaredOutputSize { expected: usize, found: usize },

    #[fail(display = "output buffer holds {} elements, but {} are needed", found, needed)]
    OutputCapacity { needed: usize, found: usize },
}

/// Shared checks for payloads with a fixed number of buffers.
pub(crate) fn check_buffer_counts<I, O>(
    data: &TaskData<'_, I, O>,
    num_inputs: usize,
    num_outputs: usize,
) -> Result<(), InvalidPayload> {
    if data.inputs.len() != num_inputs {
        return Err(InvalidPayload::InputBuffers { expected: num_inputs, found: data.inputs.len() });
    }
    if data.outputs.len() != num_outputs {
        return Err(InvalidPayload::OutputBuffers { expected: num_outputs, found: data.outputs.len() });
    }
    if data.inputs_count.is_empty() {
        return Err(InvalidPayload::MissingInputCount);
    }
    if data.outputs_count.is_empty() {
        return Err(InvalidPayload::MissingOutputCount);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_system_declares_bytes() {
        let matrix = [1.0, 0.0, 0.0, 1.0];
        let rhs = [1.0, 2.0];
        let mut out = [0.0; 2];
        let data = LinearSystemData::linear_system(&matrix, &rhs, &mut out);
        assert_eq!(data.inputs.len(), 2);
        assert_eq!(data.inputs_count, vec![2]);
        assert_eq!(data.outputs_count, vec![16]);
    }

    #[test]
    fn buffer_counts() {
        let input = [1, 2, 3];
        let mut out = [0];

        let data = SequenceData::sequence(&input, &mut out);
        assert_eq!(check_buffer_counts(&data, 1, 1), Ok(()));
        assert_eq!(
            check_buffer_counts(&data, 2, 1),
            Err(InvalidPayload::InputBuffers { expected: 2, found: 1 }),
        );

        let data = SequenceData::new().with_input(&input);
        assert_eq!(
            check_buffer_counts(&data, 1, 1),
            Err(InvalidPayload::OutputBuffers { expected: 1, found: 0 }),
        );

        let mut out = [0];
        let mut data = SequenceData::sequence(&input, &mut out);
        data.outputs_count.clear();
        assert_eq!(check_buffer_counts(&data, 1, 1), Err(InvalidPayload::MissingOutputCount));
    }
}
