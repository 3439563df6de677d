use beehive_parser::Measurement;

/// In-order buffer of validated records awaiting a bulk write.
///
/// The buffer never holds more than `batch_size` records: the push that fills
/// it hands the whole batch back and leaves the buffer empty.
#[derive(Debug)]
pub struct BatchBuffer {
    batch_size: usize,
    records: Vec<Measurement>,
}

impl BatchBuffer {
    pub fn new(batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            batch_size,
            records: Vec::with_capacity(batch_size),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Appends a record, returning a full batch once the threshold is reached.
    pub fn push(&mut self, record: Measurement) -> Option<Vec<Measurement>> {
        self.records.push(record);
        if self.records.len() >= self.batch_size {
            Some(self.take())
        } else {
            None
        }
    }

    /// Hands back whatever is left, or `None` if there is nothing to flush.
    pub fn take_remainder(&mut self) -> Option<Vec<Measurement>> {
        if self.records.is_empty() {
            None
        } else {
            Some(self.take())
        }
    }

    /// Drops buffered records without flushing them.
    pub fn discard(&mut self) -> usize {
        let dropped = self.records.len();
        self.records.clear();
        dropped
    }

    fn take(&mut self) -> Vec<Measurement> {
        std::mem::replace(&mut self.records, Vec::with_capacity(self.batch_size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beehive_parser::DataType;
    use chrono::{TimeZone, Utc};

    fn reading(minute: u32) -> Measurement {
        let date = Utc.with_ymd_and_hms(2017, 1, 1, 0, minute, 0).unwrap();
        Measurement::new(1, date, DataType::Flow, minute as f64).unwrap()
    }

    #[test]
    fn flushes_exactly_at_threshold() {
        let mut buffer = BatchBuffer::new(3);
        assert!(buffer.push(reading(0)).is_none());
        assert!(buffer.push(reading(1)).is_none());

        let batch = buffer.push(reading(2)).expect("third push fills the batch");
        assert_eq!(batch.len(), 3);
        assert!(buffer.is_empty());

        let minutes: Vec<f64> = batch.iter().map(|m| m.value()).collect();
        assert_eq!(minutes, vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn remainder_is_none_when_empty() {
        let mut buffer = BatchBuffer::new(2);
        assert!(buffer.take_remainder().is_none());

        buffer.push(reading(5));
        let rest = buffer.take_remainder().expect("one record left");
        assert_eq!(rest.len(), 1);
        assert!(buffer.take_remainder().is_none());
    }

    #[test]
    fn discard_empties_buffer() {
        let mut buffer = BatchBuffer::new(10);
        buffer.push(reading(1));
        buffer.push(reading(2));
        assert_eq!(buffer.discard(), 2);
        assert_eq!(buffer.len(), 0);
    }
}
